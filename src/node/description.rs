//! Static description of the node, as registered with the host.

use crate::credentials::GEMINI_CREDENTIAL;
use serde::Serialize;

/// Internal node type name.
pub const NODE_NAME: &str = "googleveo";

/// Node metadata consumed by the host to render and wire the node.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    /// Name shown in the editor.
    pub display_name: &'static str,
    /// Internal type name.
    pub name: &'static str,
    /// Editor categories.
    pub group: Vec<&'static str>,
    /// Node type version.
    pub version: u32,
    /// One-line summary.
    pub description: &'static str,
    /// Defaults for new instances.
    pub defaults: NodeDefaults,
    /// Input connection kinds.
    pub inputs: Vec<&'static str>,
    /// Output connection kinds.
    pub outputs: Vec<&'static str>,
    /// Whether agents may call the node as a tool.
    pub usable_as_tool: bool,
    /// Credentials the node requires.
    pub credentials: Vec<CredentialRequirement>,
    /// User-facing parameters.
    pub properties: Vec<NodeProperty>,
}

/// Default settings applied when the node is added to a workflow.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDefaults {
    /// Default instance name.
    pub name: &'static str,
}

/// A credential the node needs at execution time.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialRequirement {
    /// Credential type name.
    pub name: &'static str,
    /// Whether execution fails without it.
    pub required: bool,
}

/// A user-facing parameter of the node.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperty {
    /// Label shown in the editor.
    pub display_name: &'static str,
    /// Parameter name.
    pub name: &'static str,
    /// Value type, e.g. `string`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Editor hints such as the number of rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_options: Option<serde_json::Value>,
    /// Initial value.
    pub default: serde_json::Value,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Example shown in an empty field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    /// Help text.
    pub description: &'static str,
}

impl NodeDescription {
    /// Description of the Veo video generation node.
    pub fn veo() -> Self {
        Self {
            display_name: "GoogleVeo",
            name: NODE_NAME,
            group: vec!["transform"],
            version: 1,
            description: "Generate videos using Google Veo3",
            defaults: NodeDefaults { name: "GoogleVeo" },
            inputs: vec!["main"],
            outputs: vec!["main"],
            usable_as_tool: true,
            credentials: vec![CredentialRequirement {
                name: GEMINI_CREDENTIAL,
                required: true,
            }],
            properties: vec![NodeProperty {
                display_name: "Prompt",
                name: "prompt",
                kind: "string",
                type_options: Some(serde_json::json!({ "rows": 4 })),
                default: serde_json::Value::String(String::new()),
                required: true,
                placeholder: Some(
                    "A golden retriever playing in autumn leaves, cinematic lighting",
                ),
                description: "Describe the video you want to generate",
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_serialization() {
        let json = serde_json::to_value(NodeDescription::veo()).unwrap();
        assert_eq!(json["name"], "googleveo");
        assert_eq!(json["displayName"], "GoogleVeo");
        assert_eq!(json["usableAsTool"], true);
        assert_eq!(json["credentials"][0]["name"], "geminiApi");

        let prompt = &json["properties"][0];
        assert_eq!(prompt["name"], "prompt");
        assert_eq!(prompt["type"], "string");
        assert_eq!(prompt["typeOptions"]["rows"], 4);
        assert_eq!(prompt["required"], true);
    }
}
