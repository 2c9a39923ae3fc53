//! Chat commands.
//!
//! A message is trimmed, an optional leading `/` dropped, and the first
//! whitespace-separated token picks the command by name or alias. Argument
//! errors are reported before any request is made.

pub mod format;

use duanju_api::gateway::{EpisodeQuery, RecommendQuery};
use duanju_api::Gateway;
use thiserror::Error;

use crate::config::DisplayConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Categories,
    Search,
    Recommend,
    Latest,
    CategoryDramas,
    Episodes,
}

/// Registration data handed to the host: a name, its aliases and a usage line.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub command: Command,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub description: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: Command::Categories,
        name: "短剧分类",
        aliases: &["duanju_categories"],
        usage: "/短剧分类",
        description: "获取短剧分类列表",
    },
    CommandSpec {
        command: Command::Search,
        name: "搜索短剧",
        aliases: &["duanju_search"],
        usage: "/搜索短剧 剧名",
        description: "根据名称搜索短剧",
    },
    CommandSpec {
        command: Command::Recommend,
        name: "短剧推荐",
        aliases: &["duanju_recommend"],
        usage: "/短剧推荐",
        description: "获取推荐短剧",
    },
    CommandSpec {
        command: Command::Latest,
        name: "最新短剧",
        aliases: &["duanju_latest"],
        usage: "/最新短剧",
        description: "获取最新短剧",
    },
    CommandSpec {
        command: Command::CategoryDramas,
        name: "分类短剧",
        aliases: &["duanju_category"],
        usage: "/分类短剧 分类ID [页码]",
        description: "获取指定分类的热门短剧",
    },
    CommandSpec {
        command: Command::Episodes,
        name: "短剧剧集",
        aliases: &["duanju_episodes"],
        usage: "/短剧剧集 短剧ID [集数]",
        description: "获取短剧的剧集播放地址，不指定集数则获取全集",
    },
];

/// A reply payload for the host to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Plain(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) => text,
        }
    }
}

/// A command with its arguments parsed and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Categories,
    Search { name: String },
    Recommend,
    Latest,
    CategoryDramas { category_id: i64, page: u32 },
    Episodes(EpisodeQuery),
}

/// Argument problems; the display text is the reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("❌ 请提供要搜索的短剧名称\n使用方法: /搜索短剧 剧名")]
    MissingName,

    #[error("❌ 请提供分类ID\n使用方法: /分类短剧 分类ID [页码]")]
    MissingCategory,

    #[error("❌ 参数格式错误，分类ID和页码必须是数字")]
    BadCategoryArgs,

    #[error("❌ 请提供短剧ID\n使用方法: /短剧剧集 短剧ID [集数]")]
    MissingDrama,

    #[error("❌ 参数格式错误，短剧ID和集数必须是数字")]
    BadEpisodeArgs,
}

/// Find the command a message addresses. Returns the rest of the line.
pub fn resolve(text: &str) -> Option<(&'static CommandSpec, &str)> {
    let text = text.trim();
    let text = text.strip_prefix('/').unwrap_or(text);
    let (token, rest) = match text.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest),
        None => (text, ""),
    };

    COMMANDS
        .iter()
        .find(|spec| spec.name == token || spec.aliases.iter().any(|a| *a == token))
        .map(|spec| (spec, rest))
}

pub fn parse(command: Command, args: &str) -> Result<Invocation, ArgError> {
    match command {
        Command::Categories => Ok(Invocation::Categories),
        Command::Recommend => Ok(Invocation::Recommend),
        Command::Latest => Ok(Invocation::Latest),
        Command::Search => {
            let name = args.trim();
            if name.is_empty() {
                return Err(ArgError::MissingName);
            }
            Ok(Invocation::Search {
                name: name.to_string(),
            })
        }
        Command::CategoryDramas => {
            let mut parts = args.split_whitespace();
            let id = parts.next().ok_or(ArgError::MissingCategory)?;
            let category_id = id.parse().map_err(|_| ArgError::BadCategoryArgs)?;
            let page = parse_positive(parts.next()).ok_or(ArgError::BadCategoryArgs)?;
            Ok(Invocation::CategoryDramas {
                category_id,
                page: page.unwrap_or(1),
            })
        }
        Command::Episodes => {
            let mut parts = args.split_whitespace();
            let id = parts.next().ok_or(ArgError::MissingDrama)?;
            let drama_id = id.parse().map_err(|_| ArgError::BadEpisodeArgs)?;
            let episode = parse_positive(parts.next()).ok_or(ArgError::BadEpisodeArgs)?;
            Ok(Invocation::Episodes(EpisodeQuery { drama_id, episode }))
        }
    }
}

/// `None` on a malformed or zero value, `Some(None)` when absent.
fn parse_positive(arg: Option<&str>) -> Option<Option<u32>> {
    match arg {
        None => Some(None),
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n >= 1 => Some(Some(n)),
            _ => None,
        },
    }
}

/// Run a parsed command and render its reply text.
pub async fn run(gateway: &Gateway, display: &DisplayConfig, invocation: &Invocation) -> String {
    tracing::debug!(?invocation, "running chat command");
    match invocation {
        Invocation::Categories => match gateway.categories().await {
            Ok(list) => format::categories(&list),
            Err(e) => e.to_string(),
        },
        Invocation::Search { name } => match gateway.search(name).await {
            Ok(results) => format::search(name, &results, display.search_limit),
            Err(e) => e.to_string(),
        },
        Invocation::Recommend => {
            let query = RecommendQuery {
                category_id: None,
                size: display.recommend_size,
            };
            match gateway.recommendations(query).await {
                Ok(payload) => format::recommendations(&payload),
                Err(e) => e.to_string(),
            }
        }
        Invocation::Latest => match gateway.latest(1).await {
            Ok(payload) => format::latest(&payload),
            Err(e) => e.to_string(),
        },
        Invocation::CategoryDramas { category_id, page } => {
            match gateway.category_dramas(*category_id, *page).await {
                Ok(listing) => format::category_page(*category_id, &listing),
                Err(e) => e.to_string(),
            }
        }
        Invocation::Episodes(query) => match gateway.episodes(*query).await {
            Ok(payload) => format::episodes(query, &payload, display.episode_limit),
            Err(e) => e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_name_alias_and_slash() {
        let (spec, rest) = resolve("/搜索短剧 霸道总裁").unwrap();
        assert_eq!(spec.command, Command::Search);
        assert_eq!(rest, "霸道总裁");

        let (spec, rest) = resolve("duanju_latest").unwrap();
        assert_eq!(spec.command, Command::Latest);
        assert_eq!(rest, "");

        let (spec, rest) = resolve("  分类短剧   3  2 ").unwrap();
        assert_eq!(spec.command, Command::CategoryDramas);
        assert_eq!(parse(spec.command, rest).unwrap(), Invocation::CategoryDramas {
            category_id: 3,
            page: 2
        });
    }

    #[test]
    fn test_resolve_ignores_other_messages() {
        assert!(resolve("hello there").is_none());
        assert!(resolve("").is_none());
        assert!(resolve("/搜索短剧啊").is_none());
    }

    #[test]
    fn test_search_keeps_inner_spaces_and_rejects_blank() {
        assert_eq!(
            parse(Command::Search, "  我的 老婆  ").unwrap(),
            Invocation::Search {
                name: "我的 老婆".into()
            }
        );
        assert_eq!(parse(Command::Search, "   "), Err(ArgError::MissingName));
    }

    #[test]
    fn test_category_args() {
        assert_eq!(
            parse(Command::CategoryDramas, "7").unwrap(),
            Invocation::CategoryDramas {
                category_id: 7,
                page: 1
            }
        );
        assert_eq!(parse(Command::CategoryDramas, ""), Err(ArgError::MissingCategory));
        assert_eq!(parse(Command::CategoryDramas, "x"), Err(ArgError::BadCategoryArgs));
        assert_eq!(parse(Command::CategoryDramas, "1 abc"), Err(ArgError::BadCategoryArgs));
        assert_eq!(parse(Command::CategoryDramas, "1 0"), Err(ArgError::BadCategoryArgs));
    }

    #[test]
    fn test_episode_args() {
        assert_eq!(
            parse(Command::Episodes, "12 5").unwrap(),
            Invocation::Episodes(EpisodeQuery {
                drama_id: 12,
                episode: Some(5)
            })
        );
        assert_eq!(
            parse(Command::Episodes, "12").unwrap(),
            Invocation::Episodes(EpisodeQuery {
                drama_id: 12,
                episode: None
            })
        );
        assert_eq!(parse(Command::Episodes, ""), Err(ArgError::MissingDrama));
        assert_eq!(parse(Command::Episodes, "12 第五集"), Err(ArgError::BadEpisodeArgs));
        assert_eq!(parse(Command::Episodes, "12 0"), Err(ArgError::BadEpisodeArgs));
    }

    #[test]
    fn test_command_names_and_aliases_are_unique() {
        let mut tokens: Vec<_> = COMMANDS
            .iter()
            .flat_map(|c| std::iter::once(c.name).chain(c.aliases.iter().copied()))
            .collect();
        let count = tokens.len();
        tokens.sort_unstable();
        tokens.dedup();
        assert_eq!(tokens.len(), count);
    }
}
