use std::collections::BTreeMap;
use std::ffi::CString;

#[derive(Debug, Clone, PartialEq)]
struct Variable {
    value: Option<String>,
    exported: bool,
}

/// Shell variables, sorted by name, each with an "exported" mark.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    vars: BTreeMap<String, Variable>,
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import all OS environment variables, marked as exported.
    pub fn from_os() -> Self {
        let mut env = Environment::new();
        for (k, v) in std::env::vars_os() {
            if let (Ok(k), Ok(v)) = (k.into_string(), v.into_string()) {
                env.export_value(&k, &v);
            }
        }
        env
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).and_then(|v| v.value.as_deref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Set a value, keeping the exported mark of an existing entry.
    pub fn set(&mut self, key: &str, value: &str) {
        self.vars
            .entry(key.to_string())
            .and_modify(|var| var.value = Some(value.to_string()))
            .or_insert(Variable {
                value: Some(value.to_string()),
                exported: false,
            });
    }

    pub fn export_value(&mut self, key: &str, value: &str) {
        self.vars.insert(
            key.to_string(),
            Variable {
                value: Some(value.to_string()),
                exported: true,
            },
        );
    }

    /// Mark a name exported; an unknown name is created without a value.
    pub fn export(&mut self, key: &str) {
        self.vars
            .entry(key.to_string())
            .and_modify(|var| var.exported = true)
            .or_insert(Variable {
                value: None,
                exported: true,
            });
    }

    pub fn unset(&mut self, key: &str) {
        self.vars.remove(key);
    }

    /// Exported entries in name order; the value is `None` for `export NAME`.
    pub fn exported(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.vars
            .iter()
            .filter(|(_, v)| v.exported)
            .map(|(k, v)| (k.as_str(), v.value.as_deref()))
    }

    /// `NAME=value` strings handed to `execve`.
    pub fn to_envp(&self) -> Vec<CString> {
        self.exported()
            .filter_map(|(k, v)| v.map(|v| format!("{}={}", k, v)))
            .filter_map(|entry| CString::new(entry).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os_imports_exported_vars() {
        let env = Environment::from_os();
        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(env.get("PATH"), Some(path.as_str()));
            assert!(env.exported().any(|(k, _)| k == "PATH"));
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut env = Environment::new();
        env.set("FOO", "bar");
        assert_eq!(env.get("FOO"), Some("bar"));
    }

    #[test]
    fn test_unset() {
        let mut env = Environment::new();
        env.set("FOO", "bar");
        env.unset("FOO");
        assert_eq!(env.get("FOO"), None);
        assert!(!env.contains("FOO"));
    }

    #[test]
    fn test_export() {
        let mut env = Environment::new();
        env.set("FOO", "bar");
        assert!(env.to_envp().is_empty());
        env.export("FOO");
        assert_eq!(env.to_envp(), vec![CString::new("FOO=bar").unwrap()]);
    }

    #[test]
    fn test_set_keeps_export_mark() {
        let mut env = Environment::new();
        env.export_value("FOO", "1");
        env.set("FOO", "2");
        assert_eq!(env.exported().collect::<Vec<_>>(), vec![("FOO", Some("2"))]);
    }

    #[test]
    fn test_export_without_value() {
        let mut env = Environment::new();
        env.export("EMPTY");
        assert_eq!(env.get("EMPTY"), None);
        assert!(env.contains("EMPTY"));
        assert_eq!(env.exported().collect::<Vec<_>>(), vec![("EMPTY", None)]);
        assert!(env.to_envp().is_empty());
    }

    #[test]
    fn test_exported_in_name_order() {
        let mut env = Environment::new();
        env.export_value("ZED", "z");
        env.export_value("ALPHA", "a");
        env.set("LOCAL", "l");
        let names: Vec<&str> = env.exported().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["ALPHA", "ZED"]);
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("PATH"));
        assert!(is_valid_name("_x1"));
        assert!(!is_valid_name("1x"));
        assert!(!is_valid_name("A-B"));
        assert!(!is_valid_name(""));
    }
}
