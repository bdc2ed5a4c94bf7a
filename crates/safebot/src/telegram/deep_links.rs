//! Deep links — `t.me/<bot>?start=<param>` routing into specific features.

use safecore::config;

/// Feature a deep link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeepLink {
    AddPassword,
    AddTask,
    UploadFile,
    ViewPasswords,
    ViewTasks,
    ViewFiles,
    Search,
    Settings,
}

const PREFIXES: &[(DeepLink, &str)] = &[
    (DeepLink::AddPassword, "addpwd"),
    (DeepLink::AddTask, "addtsk"),
    (DeepLink::UploadFile, "upfile"),
    (DeepLink::ViewPasswords, "vpwd"),
    (DeepLink::ViewTasks, "vtsk"),
    (DeepLink::ViewFiles, "vfile"),
    (DeepLink::Search, "srch"),
    (DeepLink::Settings, "sett"),
];

impl DeepLink {
    /// Parses the /start payload. Extra `_k=v` parameters after the prefix
    /// are tolerated and ignored.
    pub fn parse(start_param: &str) -> Option<Self> {
        if start_param.is_empty() {
            return None;
        }
        PREFIXES
            .iter()
            .find(|(_, prefix)| start_param.starts_with(prefix))
            .map(|(link, _)| *link)
    }

    /// Builds the shareable URL for this feature.
    pub fn url(self) -> String {
        let prefix = PREFIXES
            .iter()
            .find(|(link, _)| *link == self)
            .map(|(_, prefix)| *prefix)
            .unwrap_or_default();
        format!("https://t.me/{}?start={}", config::BOT_USERNAME.as_str(), prefix)
    }

    /// Human-readable description shown after login.
    pub fn description(self) -> &'static str {
        match self {
            DeepLink::AddPassword => "🔐 Save a new password",
            DeepLink::AddTask => "✅ Create a new task",
            DeepLink::UploadFile => "📁 Upload a file",
            DeepLink::ViewPasswords => "🔐 View your passwords",
            DeepLink::ViewTasks => "✅ View your tasks",
            DeepLink::ViewFiles => "📁 Browse your files",
            DeepLink::Search => "🔍 Search your data",
            DeepLink::Settings => "⚙️ Open settings",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_known_prefixes() {
        assert_eq!(DeepLink::parse("addpwd"), Some(DeepLink::AddPassword));
        assert_eq!(DeepLink::parse("vtsk_filter=pending"), Some(DeepLink::ViewTasks));
        assert_eq!(DeepLink::parse("srch_q=work"), Some(DeepLink::Search));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(DeepLink::parse(""), None);
        assert_eq!(DeepLink::parse("bogus"), None);
    }

    #[test]
    fn test_url_round_trips_through_parse() {
        for (link, _) in PREFIXES {
            let url = link.url();
            let param = url.rsplit('=').next().unwrap();
            assert_eq!(DeepLink::parse(param), Some(*link));
        }
    }
}
