use serde_json::Value;

/// リッチテキスト（Atlassian Document Format）のノード
///
/// `text` を持つ葉、`content` の子を持つノード、ノードの列のいずれか。
/// 元データは非循環なので再帰は必ず停止する。
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Empty,
    Text(String),
    Node(Vec<DocNode>),
    Sequence(Vec<DocNode>),
}

impl DocNode {
    /// ノードの文字列を区切りなしで連結する
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match self {
            DocNode::Empty => {}
            DocNode::Text(text) => out.push_str(text),
            DocNode::Node(children) | DocNode::Sequence(children) => {
                for child in children {
                    child.write_text(out);
                }
            }
        }
    }
}

impl From<&Value> for DocNode {
    fn from(value: &Value) -> Self {
        match value {
            Value::Array(items) => DocNode::Sequence(items.iter().map(DocNode::from).collect()),
            Value::Object(map) => {
                if let Some(Value::String(text)) = map.get("text") {
                    return DocNode::Text(text.clone());
                }
                match map.get("content") {
                    Some(Value::Array(children)) => {
                        DocNode::Node(children.iter().map(DocNode::from).collect())
                    }
                    Some(Value::Null) | None => DocNode::Empty,
                    Some(other) => DocNode::Node(vec![DocNode::from(other)]),
                }
            }
            // 裸の文字列・数値・null はノードではない
            _ => DocNode::Empty,
        }
    }
}

/// JSONのドキュメントツリーをプレーンテキストにする
pub fn flatten(node: &Value) -> String {
    DocNode::from(node).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_text_leaf() {
        assert_eq!(flatten(&json!({ "text": "abc" })), "abc");
    }

    #[test]
    fn test_flatten_content_children() {
        let doc = json!({ "content": [{ "text": "a" }, { "text": "b" }] });
        assert_eq!(flatten(&doc), "ab");
    }

    #[test]
    fn test_flatten_null_and_empty() {
        assert_eq!(flatten(&Value::Null), "");
        assert_eq!(flatten(&json!({})), "");
        assert_eq!(flatten(&json!([])), "");
        assert_eq!(flatten(&json!("bare string")), "");
    }

    #[test]
    fn test_flatten_bare_sequence() {
        let doc = json!([{ "text": "x" }, { "content": [{ "text": "y" }] }, null]);
        assert_eq!(flatten(&doc), "xy");
    }

    #[test]
    fn test_text_takes_precedence_over_content() {
        let doc = json!({ "text": "leaf", "content": [{ "text": "ignored" }] });
        assert_eq!(flatten(&doc), "leaf");
    }

    #[test]
    fn test_flatten_realistic_adf_document() {
        // Given: 段落・箇条書き・装飾を含むADF
        let doc = json!({
            "type": "doc",
            "version": 1,
            "content": [
                {
                    "type": "paragraph",
                    "content": [
                        { "type": "text", "text": "Login fails " },
                        { "type": "text", "text": "on Safari", "marks": [{ "type": "strong" }] }
                    ]
                },
                {
                    "type": "bulletList",
                    "content": [
                        {
                            "type": "listItem",
                            "content": [
                                { "type": "paragraph", "content": [{ "type": "text", "text": "; step 1" }] }
                            ]
                        }
                    ]
                },
                { "type": "rule" },
                { "type": "hardBreak" }
            ]
        });

        // When/Then: テキストが区切りなしで連結される
        assert_eq!(flatten(&doc), "Login fails on Safari; step 1");
    }

    #[test]
    fn test_non_string_text_falls_through_to_content() {
        let doc = json!({ "text": 42, "content": [{ "text": "ok" }] });
        assert_eq!(flatten(&doc), "ok");
    }

    #[test]
    fn test_doc_node_conversion() {
        let node = DocNode::from(&json!({ "content": [{ "text": "a" }, {}] }));
        assert_eq!(
            node,
            DocNode::Node(vec![DocNode::Text("a".to_string()), DocNode::Empty])
        );
    }
}
