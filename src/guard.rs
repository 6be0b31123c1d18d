use regex::Regex;
use std::sync::LazyLock;

/// 並び替え句のみのJQL（空白を1つに畳み、小文字化した後で判定）
static ORDER_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    let field = r#"(?:"[^"]+"|[^\s,"]+)(?: (?:asc|desc))?"#;
    Regex::new(&format!(r"^order by {field}(?: ?, ?{field})*$"))
        .expect("order-by pattern is a valid regex")
});

/// ガード適用後のクエリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedQuery {
    pub jql: String,
    /// フォールバック句を前置したかどうか。`true` なら呼び出し側が警告を出す
    pub rewritten: bool,
}

/// 絞り込み条件を持たない（全件取得になる）JQLかどうか
pub fn is_unbounded(query: &str) -> bool {
    let collapsed = query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    collapsed.is_empty() || ORDER_ONLY.is_match(&collapsed)
}

/// 全件取得になり得るJQLにフォールバック句を前置する
///
/// 副作用なし。警告ログは呼び出し側の責務。
pub fn guard(query: &str, fallback: &str) -> GuardedQuery {
    if is_unbounded(query) {
        let jql = format!("{} {}", fallback, query).trim().to_string();
        GuardedQuery {
            jql,
            rewritten: true,
        }
    } else {
        GuardedQuery {
            jql: query.to_string(),
            rewritten: false,
        }
    }
}
