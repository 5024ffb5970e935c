//! Customer import template and export workbooks.
//!
//! The template has a visible `KhachHang` entry sheet whose province and
//! source columns get dropdown validation sourced from a hidden `DataLists`
//! sheet, so hand-filled files arrive with predictable values.

use common::model::customer::Customer;
use rust_xlsxwriter::{DataValidation, Format, Formula, Workbook, Worksheet, XlsxError};

/// Column order of the entry sheet. The CSV importer validates uploaded
/// headers against exactly this list.
pub const IMPORT_COLUMNS: [&str; 7] = [
    "Tên khách hàng",
    "Số điện thoại",
    "Email",
    "Địa chỉ",
    "Tỉnh/Thành phố",
    "Nguồn",
    "Ghi chú",
];

pub const PROVINCES: [&str; 34] = [
    "Hà Nội",
    "TP. Hồ Chí Minh",
    "Hải Phòng",
    "Đà Nẵng",
    "Cần Thơ",
    "Huế",
    "An Giang",
    "Bắc Ninh",
    "Cà Mau",
    "Cao Bằng",
    "Đắk Lắk",
    "Điện Biên",
    "Đồng Nai",
    "Đồng Tháp",
    "Gia Lai",
    "Hà Tĩnh",
    "Hưng Yên",
    "Khánh Hòa",
    "Lai Châu",
    "Lâm Đồng",
    "Lạng Sơn",
    "Lào Cai",
    "Nghệ An",
    "Ninh Bình",
    "Phú Thọ",
    "Quảng Ngãi",
    "Quảng Ninh",
    "Quảng Trị",
    "Sơn La",
    "Tây Ninh",
    "Thái Nguyên",
    "Thanh Hóa",
    "Tuyên Quang",
    "Vĩnh Long",
];

pub const SOURCES: [&str; 6] = ["Facebook", "Zalo", "Website", "Hotline", "Giới thiệu", "Khác"];

/// Rows covered by the dropdown validations (below the header).
const ENTRY_ROWS: u32 = 1000;

fn header_format() -> Format {
    Format::new().set_bold()
}

/// Build the blank `.xlsx` import template.
pub fn build_import_template() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();

    let mut entry = Worksheet::new();
    entry.set_name("KhachHang")?;
    let bold = header_format();
    for (col, title) in IMPORT_COLUMNS.iter().enumerate() {
        entry.write_with_format(0, col as u16, *title, &bold)?;
        entry.set_column_width(col as u16, 24)?;
    }

    let province_list = DataValidation::new().allow_list_formula(Formula::new(format!(
        "=DataLists!$A$2:$A${}",
        PROVINCES.len() + 1
    )));
    entry.add_data_validation(1, 4, ENTRY_ROWS, 4, &province_list)?;

    let source_list = DataValidation::new().allow_list_formula(Formula::new(format!(
        "=DataLists!$B$2:$B${}",
        SOURCES.len() + 1
    )));
    entry.add_data_validation(1, 5, ENTRY_ROWS, 5, &source_list)?;

    let mut lists = Worksheet::new();
    lists.set_name("DataLists")?;
    lists.write_with_format(0, 0, "Tỉnh/Thành phố", &bold)?;
    for (i, province) in PROVINCES.iter().enumerate() {
        lists.write_string(i as u32 + 1, 0, *province)?;
    }
    lists.write_with_format(0, 1, "Nguồn", &bold)?;
    for (i, source) in SOURCES.iter().enumerate() {
        lists.write_string(i as u32 + 1, 1, *source)?;
    }
    lists.set_hidden(true);

    workbook.push_worksheet(entry);
    workbook.push_worksheet(lists);
    workbook.save_to_buffer()
}

/// Export every live customer to a workbook.
pub fn build_customer_export(customers: &[Customer]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("KhachHang")?;

    let bold = header_format();
    let headers = [
        "Mã KH",
        "Tên khách hàng",
        "Số điện thoại",
        "Email",
        "Địa chỉ",
        "Tỉnh/Thành phố",
        "Nguồn",
        "Ghi chú",
        "Ngày tạo",
    ];
    for (col, title) in headers.iter().enumerate() {
        sheet.write_with_format(0, col as u16, *title, &bold)?;
        sheet.set_column_width(col as u16, 22)?;
    }

    for (i, customer) in customers.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &customer.code)?;
        sheet.write_string(row, 1, &customer.name)?;
        sheet.write_string(row, 2, customer.phone.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 3, customer.email.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 4, customer.address.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 5, customer.province.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 6, customer.source.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 7, customer.notes.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 8, &customer.created_at)?;
    }

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_nonempty_xlsx() {
        let bytes = build_import_template().unwrap();
        // xlsx files are zip archives: PK magic.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn export_handles_empty_and_filled_lists() {
        assert!(!build_customer_export(&[]).unwrap().is_empty());

        let customer = Customer {
            id: "c1".into(),
            code: "KH-0001".into(),
            name: "Nguyễn Văn A".into(),
            phone: Some("0901234567".into()),
            email: None,
            address: None,
            province: Some("Hà Nội".into()),
            source: Some("Zalo".into()),
            notes: None,
            latitude: None,
            longitude: None,
            is_del: false,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        };
        let bytes = build_customer_export(&[customer]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
