// ==========================================
// SINAPI 预算系统 - 标准字段别名表
// ==========================================
// 说明: 静态配置,运行期不可变
// 每个字段的模式按优先级排列,最具体的在前
// ==========================================

use crate::importer::column_resolver::{AliasTable, Field, FieldAlias, Pattern};
use crate::importer::header_locator::HeaderPolicy;

// ==========================================
// 单价条目表（insumos）
// ==========================================

pub const ITEM_HEADER_POLICY: HeaderPolicy = HeaderPolicy::Keyword("CODIGO");

pub const ITEM_ALIASES: AliasTable = AliasTable {
    fields: &[
        FieldAlias {
            field: Field::Code,
            strict: &[Pattern::Exact("CODIGO")],
            loose: &[Pattern::AllOf(&["COD"])],
        },
        FieldAlias {
            field: Field::Description,
            strict: &[Pattern::AllOf(&["DESCRICAO", "INSUMO"])],
            loose: &[Pattern::AllOf(&["DESCRI"])],
        },
        FieldAlias {
            field: Field::Unit,
            strict: &[Pattern::AllOf(&["UNIDADE"])],
            loose: &[Pattern::AllOf(&["UN"])],
        },
        FieldAlias {
            field: Field::ReferencePrice,
            strict: &[Pattern::AllOf(&["PRECO", "MEDIANO"])],
            loose: &[Pattern::AllOf(&["PRECO"]), Pattern::AllOf(&["PREÇO"])],
        },
    ],
    required: &[
        Field::Code,
        Field::Description,
        Field::Unit,
        Field::ReferencePrice,
    ],
    exclusive: true,
};

// ==========================================
// 组合表（composições）
// ==========================================
// 每个字段取"第一个包含该变体的列",变体按优先级逐个尝试

pub const COMPOSITE_HEADER_POLICY: HeaderPolicy =
    HeaderPolicy::AnyOf(&["CODIGO DA COMPOSICAO", "CODIGO COMPOSICAO"]);

pub const COMPOSITE_ALIASES: AliasTable = AliasTable {
    fields: &[
        FieldAlias {
            field: Field::CompositeCode,
            strict: &[
                Pattern::AllOf(&["CODIGO DA COMPOSICAO"]),
                Pattern::AllOf(&["CODIGO COMPOSICAO"]),
                Pattern::AllOf(&["CODIGO"]),
                Pattern::AllOf(&["COD"]),
            ],
            loose: &[],
        },
        FieldAlias {
            field: Field::CompositeDescription,
            strict: &[
                Pattern::AllOf(&["DESCRICAO DA COMPOSICAO"]),
                Pattern::AllOf(&["DESCRICAO COMPOSICAO"]),
                Pattern::AllOf(&["DESCRICAO"]),
            ],
            loose: &[],
        },
        FieldAlias {
            field: Field::CompositeUnit,
            strict: &[Pattern::AllOf(&["UNIDADE"])],
            loose: &[],
        },
        FieldAlias {
            field: Field::TotalCost,
            strict: &[
                Pattern::AllOf(&["CUSTO TOTAL"]),
                Pattern::AllOf(&["VALOR TOTAL"]),
            ],
            loose: &[],
        },
        FieldAlias {
            field: Field::ComponentCode,
            strict: &[
                Pattern::AllOf(&["CODIGO ITEM"]),
                Pattern::AllOf(&["CODIGO DO ITEM"]),
                Pattern::AllOf(&["COD ITEM"]),
            ],
            loose: &[],
        },
        FieldAlias {
            field: Field::ComponentKind,
            strict: &[
                Pattern::AllOf(&["TIPO ITEM"]),
                Pattern::AllOf(&["TIPO DE ITEM"]),
            ],
            loose: &[],
        },
        FieldAlias {
            field: Field::ComponentDescription,
            strict: &[
                Pattern::AllOf(&["DESCRIÇÃO ITEM"]),
                Pattern::AllOf(&["DESCRICAO DO ITEM"]),
                Pattern::AllOf(&["DESCRICAO ITEM"]),
            ],
            loose: &[],
        },
        FieldAlias {
            field: Field::ComponentUnit,
            strict: &[Pattern::AllOf(&["UNIDADE ITEM"])],
            loose: &[],
        },
        FieldAlias {
            field: Field::Coefficient,
            strict: &[Pattern::AllOf(&["COEFICIENTE"]), Pattern::AllOf(&["COEF"])],
            loose: &[],
        },
    ],
    required: &[Field::CompositeCode, Field::ComponentCode, Field::Coefficient],
    exclusive: false,
};
