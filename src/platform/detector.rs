//! Platform detection from client user agents

use regex::Regex;
use tracing::debug;

use crate::platform::types::Platform;
use crate::version::AppVersion;

/// A recognized mobile client: the platform and its reported app version.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientApp {
    pub platform: Platform,
    pub version: AppVersion,
}

/// Compiled user-agent matchers for every supported platform.
///
/// Built once at startup and read-only afterwards, so a single instance can
/// be shared across threads.
pub struct PlatformMatchers {
    matchers: Vec<(Platform, Regex)>,
}

impl PlatformMatchers {
    /// Compile the user-agent pattern of every platform, in declaration order.
    pub fn new() -> Result<Self, regex::Error> {
        let mut matchers = Vec::with_capacity(Platform::ALL.len());
        for platform in Platform::ALL {
            matchers.push((platform, Regex::new(platform.user_agent_pattern())?));
        }
        Ok(Self { matchers })
    }

    /// Identify the mobile client behind `user_agent`.
    ///
    /// Platforms are tried in declaration order and the first pattern match
    /// wins. Returns `None` for empty input, user agents matching no
    /// platform (ordinary browser traffic) and embedded versions that fail
    /// to parse; unrecognized clients are never gated.
    pub fn detect(&self, user_agent: &str) -> Option<ClientApp> {
        if user_agent.is_empty() {
            return None;
        }
        for (platform, regex) in &self.matchers {
            let Some(captures) = regex.captures(user_agent) else {
                continue;
            };
            let raw = captures.name("version")?.as_str();
            return match raw.parse::<AppVersion>() {
                Ok(version) => Some(ClientApp {
                    platform: *platform,
                    version,
                }),
                Err(err) => {
                    debug!("unparseable app version {:?} in user agent: {}", raw, err);
                    None
                }
            };
        }
        None
    }
}
