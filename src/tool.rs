use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One catalog entry. Install state is never stored here; it is derived by
/// probing the install directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub repo: String,
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub go_install_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: Vec<ToolRequirement>,
    /// Asset file name -> release asset id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub install_type: InstallType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallType {
    Go,
    /// Also the fallback for install types this version does not know.
    #[default]
    #[serde(other)]
    Binary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequirement {
    pub os: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specification: Vec<RequirementSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementSpec {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub instruction: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Case-insensitive exact-name lookup, the only way tools are cross-referenced.
pub fn find_tool<'a>(tools: &'a [Tool], name: &str) -> Option<&'a Tool> {
    tools.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

impl Tool {
    pub fn version_without_prefix(&self) -> &str {
        self.version.strip_prefix('v').unwrap_or(&self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_catalog_entry_with_nulls_and_unknown_install_type() {
        let raw = r#"{
            "name": "katana",
            "repo": "katana",
            "version": "v1.0.4",
            "go_install_path": null,
            "requirements": null,
            "assets": {"katana_1.0.4_linux_amd64.zip": "123"},
            "install_type": "docker"
        }"#;
        let tool: Tool = serde_json::from_str(raw).expect("decode");
        assert_eq!(tool.install_type, InstallType::Binary);
        assert!(tool.requirements.is_empty());
        assert_eq!(tool.go_install_path, "");
        assert_eq!(tool.version_without_prefix(), "1.0.4");
        assert_eq!(tool.assets.len(), 1);
        assert_eq!(serde_json::to_string(&tool.install_type).expect("encode"), r#""binary""#);
    }

    #[test]
    fn decodes_requirements_and_go_install_type() {
        let raw = r#"{
            "name": "naabu",
            "version": "2.1.0",
            "install_type": "go",
            "go_install_path": "github.com/projectdiscovery/naabu/v2/cmd/naabu",
            "requirements": [{"os": "linux", "specification": [
                {"name": "libpcap", "required": true, "command": "", "instruction": "apt install libpcap-dev"}
            ]}]
        }"#;
        let tool: Tool = serde_json::from_str(raw).expect("decode");
        assert_eq!(tool.install_type, InstallType::Go);
        assert_eq!(tool.requirements[0].specification[0].name, "libpcap");
        assert!(tool.assets.is_empty());
    }

    #[test]
    fn lookup_ignores_case() {
        let tools: Vec<Tool> = serde_json::from_str(
            r#"[{"name": "dnsx", "version": "1.1.1"}, {"name": "Nuclei", "version": "3.0.0"}]"#,
        )
        .expect("decode");
        assert_eq!(find_tool(&tools, "NUCLEI").map(|t| t.version.as_str()), Some("3.0.0"));
        assert!(find_tool(&tools, "dns").is_none());
    }
}
