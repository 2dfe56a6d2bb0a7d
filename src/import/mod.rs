//! Supplier spreadsheet import.
//!
//! Turns a comma-delimited export with Portuguese headers into supplier
//! create requests. Blank cells become absent fields and the classification
//! columns fall back to their defaults. Rows that cannot be mapped are
//! reported with their line number instead of aborting the import.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use crate::errors::AppError;
use crate::filter::fold_text;
use crate::models::{CreateSupplierRequest, PartsType, Specialization, Supplier};

/// Internal supplier field a CSV column feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplierField {
    Name,
    Cnpj,
    Phone,
    Email,
    ContactName,
    Street,
    Number,
    Neighborhood,
    City,
    State,
    ZipCode,
    PartsType,
    Specialization,
}

/// `"Tipo de Peças"` becomes `"tipo_de_pecas"`.
pub fn normalize_header(raw: &str) -> String {
    let folded = fold_text(raw.trim().trim_start_matches('\u{feff}'));
    let mut out = String::with_capacity(folded.len());
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

pub fn map_header(raw: &str) -> Option<SupplierField> {
    let field = match normalize_header(raw).as_str() {
        "nome" | "razao_social" | "fornecedor" | "nome_fantasia" | "name" => SupplierField::Name,
        "cnpj" => SupplierField::Cnpj,
        "telefone" | "celular" | "whatsapp" | "fone" | "phone" => SupplierField::Phone,
        "email" | "e_mail" => SupplierField::Email,
        "contato" | "responsavel" | "nome_contato" => SupplierField::ContactName,
        "rua" | "endereco" | "logradouro" => SupplierField::Street,
        "numero" | "n" | "no" => SupplierField::Number,
        "bairro" => SupplierField::Neighborhood,
        "cidade" | "municipio" => SupplierField::City,
        "estado" | "uf" => SupplierField::State,
        "cep" => SupplierField::ZipCode,
        "tipo_pecas" | "tipo_de_pecas" | "tipo" | "tipo_peca" => SupplierField::PartsType,
        "especialidade" | "especializacao" => SupplierField::Specialization,
        _ => return None,
    };
    Some(field)
}

/// A row that could not be turned into a supplier.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RowError {
    pub line: u64,
    pub message: String,
}

/// A mapped row ready to be created.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub line: u64,
    pub request: CreateSupplierRequest,
}

/// Result of mapping a whole file.
#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    pub rows: Vec<ParsedRow>,
    pub errors: Vec<RowError>,
    pub ignored_headers: Vec<String>,
}

/// What an import ended up doing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: Vec<Supplier>,
    pub skipped: Vec<RowError>,
    pub ignored_headers: Vec<String>,
}

/// Map the CSV text to supplier create requests.
pub fn parse_suppliers_csv(text: &str) -> Result<ParsedCsv, AppError> {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(AppError::BadRequest("CSV is empty".to_string()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut columns: Vec<Option<SupplierField>> = Vec::with_capacity(headers.len());
    let mut parsed = ParsedCsv::default();

    for header in headers.iter() {
        let field = map_header(header);
        if field.is_none() && !header.trim().is_empty() {
            tracing::debug!("Ignoring unknown CSV header {:?}", header);
            parsed.ignored_headers.push(header.to_string());
        }
        columns.push(field);
    }

    if !columns.iter().any(|c| *c == Some(SupplierField::Name)) {
        return Err(AppError::BadRequest(
            "CSV has no supplier name column (nome)".to_string(),
        ));
    }

    let mut saw_data = false;
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        saw_data = true;

        match map_record(&columns, &record) {
            Ok(request) => parsed.rows.push(ParsedRow { line, request }),
            Err(message) => {
                tracing::warn!("Skipping CSV line {}: {}", line, message);
                parsed.errors.push(RowError { line, message });
            }
        }
    }

    if !saw_data {
        return Err(AppError::BadRequest("CSV has no data rows".to_string()));
    }

    Ok(parsed)
}

fn map_record(
    columns: &[Option<SupplierField>],
    record: &StringRecord,
) -> Result<CreateSupplierRequest, String> {
    let mut request = CreateSupplierRequest::default();

    for (field, cell) in columns.iter().zip(record.iter()) {
        let Some(field) = field else { continue };
        if cell.is_empty() {
            continue;
        }
        let value = Some(cell.to_string());

        match field {
            SupplierField::Name => {
                if request.name.is_empty() {
                    request.name = cell.to_string();
                }
            }
            SupplierField::Cnpj => request.cnpj = value,
            SupplierField::Phone => request.phone = value,
            SupplierField::Email => request.email = value,
            SupplierField::ContactName => request.contact_name = value,
            SupplierField::Street => request.address.street = value,
            SupplierField::Number => request.address.number = value,
            SupplierField::Neighborhood => request.address.neighborhood = value,
            SupplierField::City => request.address.city = value,
            SupplierField::State => request.address.state = Some(cell.to_uppercase()),
            SupplierField::ZipCode => request.address.zip_code = value,
            SupplierField::PartsType => {
                request.parts_type = PartsType::from_label(&normalize_header(cell))
                    .ok_or_else(|| format!("Unknown parts type: {}", cell))?;
            }
            SupplierField::Specialization => {
                request.specialization = Specialization::from_label(&normalize_header(cell))
                    .ok_or_else(|| format!("Unknown specialization: {}", cell))?;
            }
        }
    }

    Ok(request)
}
