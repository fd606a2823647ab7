//! SPDX Enumerations Module
//!
//! SPDX 2.3で定義される列挙値。セル上の表記はバリアント名そのものです。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpreadsheetError;

/// バリアント名を文字列表現とする列挙型を定義する
///
/// `ALL`（全バリアント）、`as_str`、`Display`、`FromStr`を生成します。
macro_rules! spdx_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// 全バリアント（宣言順）
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// セル上の表記
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = SpreadsheetError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    _ => Err(SpreadsheetError::Format(format!(
                        "Invalid {}: {}",
                        stringify!($name),
                        s
                    ))),
                }
            }
        }
    };
}

spdx_enum! {
    /// チェックサムのアルゴリズム
    ChecksumAlgorithm {
        SHA1, SHA224, SHA256, SHA384, SHA512,
        MD2, MD4, MD5, MD6,
        SHA3_256, SHA3_384, SHA3_512,
        BLAKE2b_256, BLAKE2b_384, BLAKE2b_512, BLAKE3,
        ADLER32,
    }
}

spdx_enum! {
    /// 要素間の関係の種類
    RelationshipType {
        DESCRIBES, DESCRIBED_BY, CONTAINS, CONTAINED_BY,
        DEPENDS_ON, DEPENDENCY_OF, DEPENDENCY_MANIFEST_OF,
        BUILD_DEPENDENCY_OF, DEV_DEPENDENCY_OF, OPTIONAL_DEPENDENCY_OF,
        PROVIDED_DEPENDENCY_OF, TEST_DEPENDENCY_OF, RUNTIME_DEPENDENCY_OF,
        EXAMPLE_OF, GENERATES, GENERATED_FROM, ANCESTOR_OF, DESCENDANT_OF,
        VARIANT_OF, DISTRIBUTION_ARTIFACT, PATCH_FOR, PATCH_APPLIED, COPY_OF,
        FILE_ADDED, FILE_DELETED, FILE_MODIFIED, EXPANDED_FROM_ARCHIVE,
        DYNAMIC_LINK, STATIC_LINK, DATA_FILE_OF, TEST_CASE_OF, BUILD_TOOL_OF,
        DEV_TOOL_OF, TEST_OF, TEST_TOOL_OF, DOCUMENTATION_OF,
        OPTIONAL_COMPONENT_OF, METAFILE_OF, PACKAGE_OF, AMENDS,
        PREREQUISITE_FOR, HAS_PREREQUISITE, REQUIREMENT_DESCRIPTION_FOR,
        SPECIFICATION_FOR, OTHER,
    }
}

spdx_enum! {
    /// ファイルの種類
    FileType {
        SOURCE, BINARY, ARCHIVE, APPLICATION, AUDIO, IMAGE, TEXT, VIDEO,
        DOCUMENTATION, SPDX, OTHER,
    }
}

spdx_enum! {
    /// 外部参照のカテゴリ
    ///
    /// 旧形式の`PACKAGE-MANAGER`のようなハイフン表記は読み込み側で変換します。
    ReferenceCategory {
        SECURITY, PACKAGE_MANAGER, PERSISTENT_ID, OTHER,
    }
}

spdx_enum! {
    /// アノテーションの種類
    AnnotationType {
        REVIEW, OTHER,
    }
}

spdx_enum! {
    /// パッケージの主な用途（SPDX 2.3）
    PackagePurpose {
        APPLICATION, FRAMEWORK, LIBRARY, CONTAINER, OPERATING_SYSTEM, DEVICE,
        FIRMWARE, SOURCE, ARCHIVE, FILE, INSTALL, OTHER,
    }
}
