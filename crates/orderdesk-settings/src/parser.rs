//! Settings parser trait and the built-in YAML implementation.

use crate::error::ParseResult;
use async_trait::async_trait;
use orderdesk_core::ConfigDocument;
use tracing::debug;

/// Turns raw settings text into a `ConfigDocument`.
///
/// Async because real deployments may parse remotely; the session only
/// ever awaits this behind its async derived document cell.
#[async_trait]
pub trait SettingsParser: Send + Sync {
    async fn parse(&self, text: &str) -> ParseResult<ConfigDocument>;
}

/// In-process YAML parser.
///
/// Blank text is a valid, empty document so a fresh profile does not
/// report a parse failure at startup.
#[derive(Debug, Default)]
pub struct YamlParser;

#[async_trait]
impl SettingsParser for YamlParser {
    async fn parse(&self, text: &str) -> ParseResult<ConfigDocument> {
        if text.trim().is_empty() {
            return Ok(ConfigDocument::default());
        }
        let doc: ConfigDocument = serde_yaml::from_str(text)?;
        debug!(
            networks = doc.networks.len(),
            orderbooks = doc.orderbooks.len(),
            deployments = doc.deployments.len(),
            "parsed settings document"
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_full_document() {
        let text = r#"
networks:
  polygon:
    rpc: https://rpc.example/polygon
    chain-id: 137
orderbooks:
  ob1:
    network: polygon
    address: "0x1111111111111111111111111111111111111111"
    subgraph: sg1
subgraphs:
  sg1: https://subgraph.example/ob1
"#;
        let doc = YamlParser.parse(text).await.unwrap();
        assert_eq!(doc.networks["polygon"].chain_id, 137);
        assert_eq!(doc.orderbooks["ob1"].subgraph.as_deref(), Some("sg1"));
        assert_eq!(doc.subgraphs["sg1"].as_str(), "https://subgraph.example/ob1");
    }

    #[tokio::test]
    async fn blank_text_is_the_empty_document() {
        let doc = YamlParser.parse("  \n").await.unwrap();
        assert!(doc.is_empty());
    }

    #[tokio::test]
    async fn rejects_malformed_yaml() {
        let err = YamlParser.parse("networks: [unclosed").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn network_keys_keep_document_order() {
        let text = r#"
networks:
  zeta:
    rpc: https://rpc.example/zeta
    chain-id: 3
  alpha:
    rpc: https://rpc.example/alpha
    chain-id: 1
"#;
        let doc = YamlParser.parse(text).await.unwrap();
        // Document order, not lexical order; default selection relies on it.
        assert_eq!(doc.networks.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }
}
