//! Model Store Module
//!
//! 文書名前空間とIDで要素を格納・取得するストレージ境界を定義します。
//! スプレッドシートアダプタはこのトレイトを通してのみモデルにアクセスします。

use std::collections::BTreeMap;

use super::{ElementKind, SpdxDocument, SpdxElement, SpdxFile, SpdxPackage, SpdxSnippet, SPDX_DOCUMENT_ID};

/// 生成IDの接頭辞
const GENERATED_ID_PREFIX: &str = "SPDXRef-gnrtd";

/// モデルストア
///
/// 要素は`(文書名前空間, ID)`で一意に識別されます。型付きの取得メソッドは
/// 既定実装として提供されるため、実装側は基本操作のみを実装すれば十分です。
pub trait ModelStore {
    /// 要素が存在するかを判定
    fn exists(&self, namespace: &str, id: &str) -> bool;

    /// 要素を取得
    fn get(&self, namespace: &str, id: &str) -> Option<&SpdxElement>;

    /// 要素を可変参照で取得
    fn get_mut(&mut self, namespace: &str, id: &str) -> Option<&mut SpdxElement>;

    /// 要素を格納（同じIDの要素は置き換え）
    fn put(&mut self, namespace: &str, element: SpdxElement);

    /// 名前空間内で未使用のSPDX識別子を生成
    fn next_id(&mut self, namespace: &str) -> String;

    /// 名前空間内の指定種別の要素をID順に列挙
    fn elements(&self, namespace: &str, kind: ElementKind) -> Vec<&SpdxElement>;

    /// 文書を持つ名前空間の一覧
    fn document_namespaces(&self) -> Vec<String>;

    /// 名前空間内の全要素を削除
    fn clear(&mut self, namespace: &str);

    fn document(&self, namespace: &str) -> Option<&SpdxDocument> {
        match self.get(namespace, SPDX_DOCUMENT_ID) {
            Some(SpdxElement::Document(doc)) => Some(doc),
            _ => None,
        }
    }

    fn document_mut(&mut self, namespace: &str) -> Option<&mut SpdxDocument> {
        match self.get_mut(namespace, SPDX_DOCUMENT_ID) {
            Some(SpdxElement::Document(doc)) => Some(doc),
            _ => None,
        }
    }

    fn package(&self, namespace: &str, id: &str) -> Option<&SpdxPackage> {
        match self.get(namespace, id) {
            Some(SpdxElement::Package(pkg)) => Some(pkg),
            _ => None,
        }
    }

    fn package_mut(&mut self, namespace: &str, id: &str) -> Option<&mut SpdxPackage> {
        match self.get_mut(namespace, id) {
            Some(SpdxElement::Package(pkg)) => Some(pkg),
            _ => None,
        }
    }

    fn file(&self, namespace: &str, id: &str) -> Option<&SpdxFile> {
        match self.get(namespace, id) {
            Some(SpdxElement::File(file)) => Some(file),
            _ => None,
        }
    }

    fn packages(&self, namespace: &str) -> Vec<&SpdxPackage> {
        self.elements(namespace, ElementKind::Package)
            .into_iter()
            .filter_map(|e| match e {
                SpdxElement::Package(pkg) => Some(pkg),
                _ => None,
            })
            .collect()
    }

    fn files(&self, namespace: &str) -> Vec<&SpdxFile> {
        self.elements(namespace, ElementKind::File)
            .into_iter()
            .filter_map(|e| match e {
                SpdxElement::File(file) => Some(file),
                _ => None,
            })
            .collect()
    }

    fn snippets(&self, namespace: &str) -> Vec<&SpdxSnippet> {
        self.elements(namespace, ElementKind::Snippet)
            .into_iter()
            .filter_map(|e| match e {
                SpdxElement::Snippet(snippet) => Some(snippet),
                _ => None,
            })
            .collect()
    }
}

/// `BTreeMap`によるインメモリ実装
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    namespaces: BTreeMap<String, BTreeMap<String, SpdxElement>>,
    next_ids: BTreeMap<String, u64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelStore for InMemoryStore {
    fn exists(&self, namespace: &str, id: &str) -> bool {
        self.namespaces
            .get(namespace)
            .map(|elements| elements.contains_key(id))
            .unwrap_or(false)
    }

    fn get(&self, namespace: &str, id: &str) -> Option<&SpdxElement> {
        self.namespaces.get(namespace)?.get(id)
    }

    fn get_mut(&mut self, namespace: &str, id: &str) -> Option<&mut SpdxElement> {
        self.namespaces.get_mut(namespace)?.get_mut(id)
    }

    fn put(&mut self, namespace: &str, element: SpdxElement) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(element.id().to_string(), element);
    }

    fn next_id(&mut self, namespace: &str) -> String {
        loop {
            let counter = self.next_ids.entry(namespace.to_string()).or_insert(0);
            *counter += 1;
            let candidate = format!("{}{}", GENERATED_ID_PREFIX, counter);
            if !self.exists(namespace, &candidate) {
                return candidate;
            }
        }
    }

    fn elements(&self, namespace: &str, kind: ElementKind) -> Vec<&SpdxElement> {
        self.namespaces
            .get(namespace)
            .map(|elements| elements.values().filter(|e| e.kind() == kind).collect())
            .unwrap_or_default()
    }

    fn document_namespaces(&self) -> Vec<String> {
        self.namespaces
            .iter()
            .filter(|(_, elements)| elements.contains_key(SPDX_DOCUMENT_ID))
            .map(|(namespace, _)| namespace.clone())
            .collect()
    }

    fn clear(&mut self, namespace: &str) {
        self.namespaces.remove(namespace);
        self.next_ids.remove(namespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://example.com/doc";

    #[test]
    fn test_put_and_get() {
        let mut store = InMemoryStore::new();
        store.put(NS, SpdxPackage::new("SPDXRef-p", "pkg").into());
        assert!(store.exists(NS, "SPDXRef-p"));
        assert!(!store.exists("other", "SPDXRef-p"));
        assert_eq!(store.package(NS, "SPDXRef-p").map(|p| p.name.as_str()), Some("pkg"));
        assert!(store.file(NS, "SPDXRef-p").is_none());
    }

    // 生成IDは既存IDと衝突しない
    #[test]
    fn test_next_id_skips_existing() {
        let mut store = InMemoryStore::new();
        store.put(NS, SpdxFile::new("SPDXRef-gnrtd1", "a.c").into());
        assert_eq!(store.next_id(NS), "SPDXRef-gnrtd2");
        assert_eq!(store.next_id(NS), "SPDXRef-gnrtd3");
    }

    #[test]
    fn test_elements_and_namespaces() {
        let mut store = InMemoryStore::new();
        store.put(NS, SpdxDocument::new(NS, "doc").into());
        store.put(NS, SpdxFile::new("SPDXRef-b", "b.c").into());
        store.put(NS, SpdxFile::new("SPDXRef-a", "a.c").into());
        store.put("other", SpdxFile::new("SPDXRef-c", "c.c").into());

        let files: Vec<_> = store.files(NS).iter().map(|f| f.id.clone()).collect();
        assert_eq!(files, vec!["SPDXRef-a", "SPDXRef-b"]);
        assert_eq!(store.document_namespaces(), vec![NS.to_string()]);

        store.clear(NS);
        assert!(store.document(NS).is_none());
        assert!(store.document_namespaces().is_empty());
    }
}
