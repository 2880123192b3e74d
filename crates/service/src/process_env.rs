use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

const ENV_CANDIDATES: [&str; 3] = ["multilens.env", "Multilens.env", ".env"];
const DEFAULT_HF_TOKEN_FILENAME: &str = "multilens.hf-token";

pub const ENV_HF_TOKEN: &str = "MULTILENS_HF_TOKEN";
pub const ENV_HF_TOKEN_FILE: &str = "MULTILENS_HF_TOKEN_FILE";

pub(crate) fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn strip_inline_comment(value: &str) -> &str {
    // Only treat ` #` as comment start (common dotenv behavior).
    let Some(pos) = value.find(" #") else {
        return value;
    };
    value[..pos].trim_end()
}

fn parse_dotenv_kv(line: &str) -> Option<(String, String)> {
    let mut line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
        return None;
    }
    if let Some(rest) = line.strip_prefix("export ") {
        line = rest.trim();
    }
    let (key, raw_value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let mut value = raw_value.trim();
    if (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
        || (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
    {
        value = &value[1..value.len() - 1];
    } else {
        value = strip_inline_comment(value);
    }
    Some((key.to_string(), value.to_string()))
}

fn find_env_file_in_dir(dir: &Path) -> Option<PathBuf> {
    for name in ENV_CANDIDATES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Result of applying one env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvFileLoad {
    pub path: PathBuf,
    pub applied: usize,
}

/// Applies `KEY=value` lines from the first env file beside the executable.
/// Variables already present in the process environment win. Runs before
/// logging is installed, so the caller reports the result.
pub fn load_env_from_exe_dir() -> Option<EnvFileLoad> {
    let path = find_env_file_in_dir(&exe_dir())?;
    apply_env_file(&path)
}

pub(crate) fn apply_env_file(path: &Path) -> Option<EnvFileLoad> {
    let mut f = fs::File::open(path).ok()?;
    let mut text = String::new();
    f.read_to_string(&mut text).ok()?;

    let mut applied = 0usize;
    for line in text.lines() {
        let Some((key, value)) = parse_dotenv_kv(line) else {
            continue;
        };
        if std::env::var_os(&key).is_some() {
            continue;
        }
        std::env::set_var(key, value);
        applied += 1;
    }

    Some(EnvFileLoad {
        path: path.to_path_buf(),
        applied,
    })
}

fn resolve_path_with_base(raw: &str, base_dir: &Path) -> PathBuf {
    let raw = raw.trim();
    if raw.is_empty() {
        return PathBuf::new();
    }
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    base_dir.join(path)
}

pub(crate) fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn hf_token_file_path() -> PathBuf {
    match env_non_empty(ENV_HF_TOKEN_FILE) {
        Some(raw) => resolve_path_with_base(&raw, &exe_dir()),
        None => exe_dir().join(DEFAULT_HF_TOKEN_FILENAME),
    }
}

pub(crate) fn read_token_from_file(path: &Path) -> Option<String> {
    let Ok(mut f) = fs::File::open(path) else {
        return None;
    };
    let mut buf = String::new();
    if f.read_to_string(&mut buf).is_err() {
        return None;
    }
    let token = buf.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

pub(crate) fn read_hf_token_from_env_or_file() -> Option<String> {
    env_non_empty(ENV_HF_TOKEN).or_else(|| read_token_from_file(&hf_token_file_path()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_lines_parse_quotes_exports_and_comments() {
        assert_eq!(
            parse_dotenv_kv("export MULTILENS_RETRY_MAX_ATTEMPTS=5 # more patience"),
            Some(("MULTILENS_RETRY_MAX_ATTEMPTS".to_string(), "5".to_string()))
        );
        assert_eq!(
            parse_dotenv_kv("MULTILENS_HF_TOKEN=\"hf abc # not a comment\""),
            Some((
                "MULTILENS_HF_TOKEN".to_string(),
                "hf abc # not a comment".to_string()
            ))
        );
        assert_eq!(parse_dotenv_kv("# comment"), None);
        assert_eq!(parse_dotenv_kv("; comment"), None);
        assert_eq!(parse_dotenv_kv("=value"), None);
        assert_eq!(parse_dotenv_kv("no_equals_sign"), None);
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/opt/multilens");
        assert_eq!(
            resolve_path_with_base("secrets/token", base),
            PathBuf::from("/opt/multilens/secrets/token")
        );
        assert_eq!(resolve_path_with_base("  ", base), PathBuf::new());
    }

    #[test]
    fn token_file_is_trimmed_and_blank_is_none() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("multilens-token-{}", std::process::id()));
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("token");
        fs::write(&path, "  hf_secret\n").expect("write token");
        assert_eq!(read_token_from_file(&path).as_deref(), Some("hf_secret"));
        fs::write(&path, "\n").expect("write blank token");
        assert_eq!(read_token_from_file(&path), None);
        assert_eq!(read_token_from_file(&dir.join("missing")), None);
        let _ = fs::remove_dir_all(&dir);
    }
}
