//! Quotation export workbook.
//!
//! The visible `BaoGia` sheet holds a header block and the line table; unit
//! prices are `VLOOKUP` formulas against a hidden `BangGia` pricing sheet and
//! line totals are `IF`-guarded products, so the numbers stay live when the
//! recipient edits quantities.

use common::model::customer::Customer;
use common::model::quotation::Quotation;
use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet, XlsxError};

/// First data row of the line table (0-based).
const FIRST_LINE_ROW: u32 = 7;

pub fn build_quotation_export(
    quotation: &Quotation,
    customer: &Customer,
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    // Pricing sheet rows: one (service name, unit price) pair per distinct
    // service, from the quotation's own snapshots.
    let mut price_rows: Vec<(&str, f64)> = Vec::new();
    for line in &quotation.lines {
        if !price_rows.iter().any(|(name, _)| *name == line.service_name) {
            price_rows.push((&line.service_name, line.unit_price));
        }
    }
    let price_table_end = price_rows.len() as u32 + 1;

    let mut sheet = Worksheet::new();
    sheet.set_name("BaoGia")?;
    sheet.set_column_width(0, 6)?;
    sheet.set_column_width(1, 36)?;
    for col in 2..5u16 {
        sheet.set_column_width(col, 16)?;
    }

    sheet.write_with_format(0, 0, "BÁO GIÁ DỊCH VỤ", &bold)?;
    sheet.write_string(1, 0, "Mã báo giá:")?;
    sheet.write_string(1, 1, &quotation.code)?;
    sheet.write_string(2, 0, "Khách hàng:")?;
    sheet.write_string(2, 1, &customer.name)?;
    sheet.write_string(3, 0, "Trạng thái:")?;
    sheet.write_string(3, 1, &quotation.status)?;
    sheet.write_string(4, 0, "Ngày tạo:")?;
    sheet.write_string(4, 1, &quotation.created_at)?;

    for (col, title) in ["STT", "Dịch vụ", "Số lượng", "Đơn giá", "Thành tiền"]
        .iter()
        .enumerate()
    {
        sheet.write_with_format(FIRST_LINE_ROW - 1, col as u16, *title, &bold)?;
    }

    for (i, line) in quotation.lines.iter().enumerate() {
        let row = FIRST_LINE_ROW + i as u32;
        let excel_row = row + 1;
        sheet.write_number(row, 0, (i + 1) as f64)?;
        sheet.write_string(row, 1, &line.service_name)?;
        sheet.write_number(row, 2, line.quantity)?;
        sheet.write_formula(
            row,
            3,
            Formula::new(format!(
                "=VLOOKUP(B{excel_row},BangGia!$A$2:$B${price_table_end},2,FALSE)"
            )),
        )?;
        sheet.write_formula(
            row,
            4,
            Formula::new(format!(
                "=IF(C{excel_row}>0,C{excel_row}*D{excel_row},0)"
            )),
        )?;
    }

    let total_row = FIRST_LINE_ROW + quotation.lines.len() as u32;
    sheet.write_with_format(total_row, 3, "Tổng cộng", &bold)?;
    sheet.write_formula(
        total_row,
        4,
        Formula::new(format!(
            "=SUM(E{}:E{})",
            FIRST_LINE_ROW + 1,
            total_row
        )),
    )?;

    let mut prices = Worksheet::new();
    prices.set_name("BangGia")?;
    prices.write_with_format(0, 0, "Dịch vụ", &bold)?;
    prices.write_with_format(0, 1, "Đơn giá", &bold)?;
    for (i, (name, unit_price)) in price_rows.iter().enumerate() {
        prices.write_string(i as u32 + 1, 0, *name)?;
        prices.write_number(i as u32 + 1, 1, *unit_price)?;
    }
    prices.set_hidden(true);

    workbook.push_worksheet(sheet);
    workbook.push_worksheet(prices);
    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::quotation::QuotationLine;

    fn sample() -> (Quotation, Customer) {
        let quotation = Quotation {
            id: "q1".into(),
            code: "QU-0001".into(),
            customer_id: "c1".into(),
            opportunity_id: None,
            package_id: None,
            status: "draft".into(),
            notes: None,
            total: 1_050_000.0,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
            lines: vec![
                QuotationLine {
                    service_id: "s1".into(),
                    service_name: "Massage".into(),
                    quantity: 2.0,
                    unit_price: 350_000.0,
                    line_total: 700_000.0,
                },
                QuotationLine {
                    service_id: "s2".into(),
                    service_name: "Xông hơi".into(),
                    quantity: 1.0,
                    unit_price: 350_000.0,
                    line_total: 350_000.0,
                },
            ],
        };
        let customer = Customer {
            id: "c1".into(),
            code: "KH-0001".into(),
            name: "Nguyễn Văn A".into(),
            phone: None,
            email: None,
            address: None,
            province: None,
            source: None,
            notes: None,
            latitude: None,
            longitude: None,
            is_del: false,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        };
        (quotation, customer)
    }

    #[test]
    fn export_produces_xlsx() {
        let (quotation, customer) = sample();
        let bytes = build_quotation_export(&quotation, &customer).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
