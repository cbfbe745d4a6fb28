//! In-memory entities and repositories shared by unit tests.

use std::io::{Cursor, Read};

use calamine::{Data, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{AccessorError, RepositoryError};
use crate::schema::{Entity, EntityRepository, SpecField};

pub(crate) fn create_timestamp(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("valid timestamp")
}

fn filter_created_between<E: Clone>(
    l_records: &[E],
    created_at: impl Fn(&E) -> NaiveDateTime,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> Vec<E> {
    l_records
        .iter()
        .filter(|record| (from..=until).contains(&created_at(*record)))
        .cloned()
        .collect()
}

////////////////////////////////////////////////////////////////////////////////
// #region Product

#[derive(Debug, Clone)]
pub(crate) struct Product {
    pub id: i64,
    pub product_name: Option<String>,
    pub price: Option<String>,
    pub date_created: NaiveDateTime,
}

impl Entity for Product {
    fn entity_fields() -> Vec<SpecField<Self>> {
        vec![
            SpecField::new("id", |p: &Product| p.id),
            SpecField::new("productName", |p: &Product| p.product_name.clone()),
            SpecField::new("price", |p: &Product| p.price.clone()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ProductRepository {
    pub l_records: Vec<Product>,
}

impl ProductRepository {
    /// One product without a name, priced "9.99", created 2024-01-15.
    pub fn sample() -> Self {
        Self {
            l_records: vec![Product {
                id: 1,
                product_name: None,
                price: Some("9.99".to_string()),
                date_created: create_timestamp(2024, 1, 15),
            }],
        }
    }
}

impl EntityRepository for ProductRepository {
    type Entity = Product;

    fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.l_records.clone())
    }

    fn find_created_between(
        &self,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(filter_created_between(
            &self.l_records,
            |p| p.date_created,
            from,
            until,
        ))
    }
}

/// Second repository serving [`Product`], used for ambiguity checks.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProductArchiveRepository;

impl EntityRepository for ProductArchiveRepository {
    type Entity = Product;

    fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(Vec::new())
    }

    fn find_created_between(
        &self,
        _from: NaiveDateTime,
        _until: NaiveDateTime,
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(Vec::new())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Customer

#[derive(Debug, Clone)]
pub(crate) struct Customer {
    pub id: i64,
    pub first_name: String,
    pub email: Option<String>,
    pub date_created: NaiveDateTime,
}

impl Entity for Customer {
    fn entity_fields() -> Vec<SpecField<Self>> {
        vec![
            SpecField::new("id", |c: &Customer| c.id),
            SpecField::new("firstName", |c: &Customer| c.first_name.clone()),
            SpecField::new("email", |c: &Customer| c.email.clone()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CustomerRepository {
    pub l_records: Vec<Customer>,
    pub if_failing: bool,
}

impl CustomerRepository {
    /// Two customers created in January and March 2024; the second lacks an email.
    pub fn sample() -> Self {
        Self {
            l_records: vec![
                Customer {
                    id: 10,
                    first_name: "Ada".to_string(),
                    email: Some("ada@example.com".to_string()),
                    date_created: create_timestamp(2024, 1, 5),
                },
                Customer {
                    id: 11,
                    first_name: " ".to_string(),
                    email: None,
                    date_created: create_timestamp(2024, 3, 20),
                },
            ],
            if_failing: false,
        }
    }

    /// Repository whose every query fails.
    pub fn failing() -> Self {
        Self {
            l_records: Vec::new(),
            if_failing: true,
        }
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.if_failing {
            return Err("connection refused".into());
        }
        Ok(())
    }
}

impl EntityRepository for CustomerRepository {
    type Entity = Customer;

    fn find_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        self.check_available()?;
        Ok(self.l_records.clone())
    }

    fn find_created_between(
        &self,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<Customer>, RepositoryError> {
        self.check_available()?;
        Ok(filter_created_between(
            &self.l_records,
            |c| c.date_created,
            from,
            until,
        ))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Others

#[derive(Debug, Clone)]
pub(crate) struct AuditLog {
    pub id: i64,
    pub action: String,
}

impl Entity for AuditLog {
    fn entity_fields() -> Vec<SpecField<Self>> {
        vec![
            SpecField::new("id", |a: &AuditLog| a.id),
            SpecField::new("action", |a: &AuditLog| a.action.clone()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct AuditLogRepository;

impl EntityRepository for AuditLogRepository {
    type Entity = AuditLog;

    fn find_all(&self) -> Result<Vec<AuditLog>, RepositoryError> {
        Ok(Vec::new())
    }

    fn find_created_between(
        &self,
        _from: NaiveDateTime,
        _until: NaiveDateTime,
    ) -> Result<Vec<AuditLog>, RepositoryError> {
        Ok(Vec::new())
    }
}

/// Entity with a declared field that has no accessor.
#[derive(Debug, Clone)]
pub(crate) struct Invoice {
    pub number: String,
}

impl Entity for Invoice {
    fn entity_fields() -> Vec<SpecField<Self>> {
        vec![
            SpecField::new("number", |i: &Invoice| i.number.clone()),
            SpecField::opaque("lines"),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct InvoiceRepository;

impl EntityRepository for InvoiceRepository {
    type Entity = Invoice;

    fn find_all(&self) -> Result<Vec<Invoice>, RepositoryError> {
        Ok(vec![Invoice {
            number: "INV-001".to_string(),
        }])
    }

    fn find_created_between(
        &self,
        _from: NaiveDateTime,
        _until: NaiveDateTime,
    ) -> Result<Vec<Invoice>, RepositoryError> {
        self.find_all()
    }
}

/// Entity whose `carrier` accessor always fails.
#[derive(Debug, Clone)]
pub(crate) struct Shipment {
    pub id: i64,
}

impl Entity for Shipment {
    fn entity_fields() -> Vec<SpecField<Self>> {
        vec![
            SpecField::new("id", |s: &Shipment| s.id),
            SpecField::fallible("carrier", |_: &Shipment| {
                Err(AccessorError::Failed("lazy relation not loaded".to_string()))
            }),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ShipmentRepository;

impl EntityRepository for ShipmentRepository {
    type Entity = Shipment;

    fn find_all(&self) -> Result<Vec<Shipment>, RepositoryError> {
        Ok(vec![Shipment { id: 7 }])
    }

    fn find_created_between(
        &self,
        _from: NaiveDateTime,
        _until: NaiveDateTime,
    ) -> Result<Vec<Shipment>, RepositoryError> {
        self.find_all()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookReadback

fn cast_cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(val)) => val.clone(),
        Some(Data::Float(val)) => val.to_string(),
        Some(Data::Int(val)) => val.to_string(),
        Some(Data::Bool(val)) => val.to_string(),
        Some(other) => other.to_string(),
    }
}

fn open_workbook(bytes: &[u8]) -> Xlsx<Cursor<&[u8]>> {
    Xlsx::new(Cursor::new(bytes)).expect("open xlsx")
}

/// Sheet names in workbook order.
pub(crate) fn read_sheet_names(bytes: &[u8]) -> Vec<String> {
    open_workbook(bytes).sheet_names()
}

/// Dense text grid of one sheet, anchored at `A1`.
pub(crate) fn read_sheet_grid(bytes: &[u8], sheet_name: &str) -> Vec<Vec<String>> {
    let range = open_workbook(bytes)
        .worksheet_range(sheet_name)
        .expect("sheet range");
    let Some((n_row_end, n_col_end)) = range.end() else {
        return Vec::new();
    };

    (0..=n_row_end)
        .map(|n_row| {
            (0..=n_col_end)
                .map(|n_col| cast_cell_text(range.get_value((n_row, n_col))))
                .collect()
        })
        .collect()
}

/// Raw XML of one workbook part (`xl/styles.xml`, `xl/worksheets/sheet1.xml`, ...).
pub(crate) fn read_workbook_part(bytes: &[u8], part_name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open xlsx archive");
    let mut file = archive.by_name(part_name).expect("workbook part");
    let mut c_xml = String::new();
    file.read_to_string(&mut c_xml).expect("read workbook part");
    c_xml
}

fn find_xml_attr<'a>(c_tag: &'a str, name: &str) -> Option<&'a str> {
    let c_key = format!(" {name}=\"");
    let n_start = c_tag.find(&c_key)? + c_key.len();
    let n_len = c_tag[n_start..].find('"')?;
    Some(&c_tag[n_start..n_start + n_len])
}

fn find_xml_section<'a>(c_xml: &'a str, tag_name: &str) -> Option<&'a str> {
    let n_start = c_xml.find(&format!("<{tag_name}"))?;
    let n_end = c_xml[n_start..].find(&format!("</{tag_name}>"))?;
    Some(&c_xml[n_start..n_start + n_end])
}

/// Solid fill color (`AARRGGBB`) applied to `cell_ref` on the first worksheet.
///
/// `None` when the cell has no style or its style has no fill color.
pub(crate) fn read_cell_fill_rgb(bytes: &[u8], cell_ref: &str) -> Option<String> {
    let c_sheet = read_workbook_part(bytes, "xl/worksheets/sheet1.xml");
    let c_styles = read_workbook_part(bytes, "xl/styles.xml");

    let n_cell_start = c_sheet.find(&format!("<c r=\"{cell_ref}\""))?;
    let n_cell_end = c_sheet[n_cell_start..].find('>')?;
    let c_cell_tag = &c_sheet[n_cell_start..n_cell_start + n_cell_end];
    let n_xf: usize = find_xml_attr(c_cell_tag, "s")?.parse().ok()?;

    let c_xf_tag = find_xml_section(&c_styles, "cellXfs")?
        .split("<xf ")
        .nth(n_xf + 1)?;
    let n_fill: usize = find_xml_attr(&format!(" {c_xf_tag}"), "fillId")?
        .parse()
        .ok()?;

    let c_fill = find_xml_section(&c_styles, "fills")?
        .split("<fill>")
        .nth(n_fill + 1)?;
    let n_fg_start = c_fill.find("<fgColor")?;
    find_xml_attr(&c_fill[n_fg_start..], "rgb").map(str::to_string)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
