//! Mapping of a work order onto the fixed sequence of document blocks.

use crate::order::WorkOrder;

/// Shown in place of empty values.
const EMPTY: &str = "-";

/// Text repeated at the top of every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    /// Workshop name.
    pub title: String,
    /// City/state line, or the street address.
    pub address: String,
    /// `CNPJ: ... | Tel: ...` line.
    pub contact: String,
}

/// A bold label followed by its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Label, without the trailing colon.
    pub label: &'static str,
    /// Display value.
    pub value: String,
}

impl Field {
    fn new(label: &'static str, value: &str) -> Self {
        Self {
            label,
            value: display(value),
        }
    }
}

/// One row of the service table, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRow {
    /// 1-based line number.
    pub item: String,
    /// Description.
    pub description: String,
    /// Responsible person.
    pub responsible: String,
    /// Value with two decimals.
    pub value: String,
}

/// A layout block, drawn top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Document title.
    Title(String),
    /// Order number and date side by side.
    Meta(Field, Field),
    /// Section heading.
    Heading(&'static str),
    /// Two-column grid of labelled values.
    Fields(Vec<[Field; 2]>),
    /// Service table with a repeating header row.
    ServiceTable {
        /// Column captions.
        header: [&'static str; 4],
        /// Body rows.
        rows: Vec<ServiceRow>,
    },
    /// Grand total.
    Total {
        /// Caption.
        label: &'static str,
        /// Amount with two decimals.
        value: String,
    },
    /// Wrapped body text.
    Paragraph(String),
    /// Signature lines with captions.
    Signatures([&'static str; 2]),
    /// Vertical gap in points.
    Spacer(f32),
}

/// The complete document: a per-page header and the body blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Header drawn on every page.
    pub header: PageHeader,
    /// Body blocks in drawing order.
    pub blocks: Vec<Block>,
}

/// Build the document layout for an order.
#[must_use]
pub fn compose(order: &WorkOrder) -> Layout {
    let shop = &order.oficina;
    let address = first_non_empty(&[&shop.cidade_estado, &shop.endereco])
        .unwrap_or("Endereço não informado");

    let header = PageHeader {
        title: or(&shop.nome, "NOME DA OFICINA"),
        address: address.to_string(),
        contact: format!(
            "CNPJ: {} | Tel: {}",
            or(&shop.cnpj, "CNPJ NÃO INFORMADO"),
            or(&shop.telefone, "Telefone não informado")
        ),
    };

    let customer = &order.cliente;
    let vehicle = &order.veiculo;

    let rows = order
        .servicos
        .iter()
        .enumerate()
        .map(|(i, item)| ServiceRow {
            item: (i + 1).to_string(),
            description: display(&item.descricao),
            responsible: display(&item.responsavel),
            value: format!("{:.2}", item.valor),
        })
        .collect();

    let blocks = vec![
        Block::Title("ORDEM DE SERVIÇO / VENDA".to_string()),
        Block::Meta(
            Field::new("Nº OS", &order.numero_os),
            Field::new("Data", &order.data_os),
        ),
        Block::Spacer(8.0),
        Block::Heading("DADOS DO CLIENTE"),
        Block::Fields(vec![
            [
                Field::new("Nome", &customer.nome),
                Field::new("Telefone", &customer.telefone),
            ],
            [
                Field::new("CPF/CNPJ", &customer.documento),
                Field::new("Endereço", &customer.endereco),
            ],
        ]),
        Block::Spacer(8.0),
        Block::Heading("DADOS DO VEÍCULO"),
        Block::Fields(vec![
            [
                Field::new("Marca", &vehicle.marca),
                Field::new("Modelo", &vehicle.modelo),
            ],
            [
                Field::new("Ano", &vehicle.ano),
                Field::new("Placa", &vehicle.placa),
            ],
        ]),
        Block::Spacer(8.0),
        Block::Heading("DETALHES DO SERVIÇO / VENDA"),
        Block::ServiceTable {
            header: ["ITEM", "DESCRIÇÃO", "RESPONSÁVEL", "VALOR (R$)"],
            rows,
        },
        Block::Spacer(12.0),
        Block::Total {
            label: "TOTAL GERAL (R$)",
            value: format!("{:.2}", order.total()),
        },
        Block::Spacer(24.0),
        Block::Heading("OBSERVAÇÕES"),
        Block::Paragraph(display(&order.observacoes)),
        Block::Spacer(30.0),
        Block::Heading("ASSINATURAS"),
        Block::Signatures(["Assinatura do Cliente", "Assinatura do Responsável"]),
    ];

    Layout { header, blocks }
}

fn display(value: &str) -> String {
    or(value, EMPTY)
}

fn or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn first_non_empty<'a>(values: &[&'a String]) -> Option<&'a str> {
    values
        .iter()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}
