//! Supported mobile platforms

/// A mobile client family, identified by a distinct user-agent pattern.
///
/// Extending the gate to a new platform means adding a variant here plus
/// its pattern; everything downstream matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// All supported platforms, in detection priority order.
    pub const ALL: [Platform; 2] = [Platform::Ios, Platform::Android];

    /// Canonical name, also used as the persisted identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::Android => "Android",
        }
    }

    /// Pattern matched against the client user agent.
    ///
    /// The `version` capture group holds the embedded app version in
    /// `X.Y.Z(.tag)?` form.
    pub fn user_agent_pattern(&self) -> &'static str {
        match self {
            Platform::Ios => {
                r"\((?P<version>[0-9]+\.[0-9]+\.[0-9]+(\.[0-9a-zA-Z]*)?); OS Version [0-9.]+ \(Build [0-9a-zA-Z]*\)\)"
            }
            Platform::Android => {
                r"Dalvik/[.0-9]+ \(Linux; U; Android [.0-9]+; (.*) Build/[0-9a-zA-Z]*\) (.*)/(?P<version>[0-9]+\.[0-9]+\.[0-9]+(\.[0-9a-zA-Z]*)?)"
            }
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            _ if s.eq_ignore_ascii_case("iOS") => Ok(Platform::Ios),
            _ if s.eq_ignore_ascii_case("Android") => Ok(Platform::Android),
            _ => Err(()),
        }
    }
}
