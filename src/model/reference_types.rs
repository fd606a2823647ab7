//! Listed Reference Types Module
//!
//! SPDXが登録している外部参照タイプ（`http://spdx.org/rdf/references/`配下）の
//! レジストリ。外部参照シートのType列の短縮表記に使用します。

/// 登録済み参照タイプURIの接頭辞
pub const LISTED_REFERENCE_TYPE_PREFIX: &str = "http://spdx.org/rdf/references/";

/// 参照タイプが未設定の場合の表記
pub const NO_REFERENCE_TYPE: &str = "[No Reference Type]";

const LISTED_NAMES: &[&str] = &[
    "cpe22Type",
    "cpe23Type",
    "maven-central",
    "npm",
    "nuget",
    "bower",
    "purl",
    "swh",
    "gitoid",
    "advisory",
    "fix",
    "url",
    "swid",
];

/// URIに対応する登録名を取得
///
/// # 使用例
///
/// ```rust
/// use spdx_spreadsheet::model::listed_reference_name;
///
/// assert_eq!(listed_reference_name("http://spdx.org/rdf/references/cpe23Type"), Some("cpe23Type"));
/// assert_eq!(listed_reference_name("http://example.com/type"), None);
/// ```
pub fn listed_reference_name(uri: &str) -> Option<&'static str> {
    let name = uri.strip_prefix(LISTED_REFERENCE_TYPE_PREFIX)?;
    LISTED_NAMES.iter().copied().find(|listed| *listed == name)
}

/// 登録名に対応するURIを取得
pub fn listed_reference_uri(name: &str) -> Option<String> {
    LISTED_NAMES
        .iter()
        .find(|listed| **listed == name)
        .map(|listed| format!("{}{}", LISTED_REFERENCE_TYPE_PREFIX, listed))
}
