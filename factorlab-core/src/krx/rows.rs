//! Raw KRX report payloads and their mapping to bars.
//!
//! Every numeric field arrives as a string with thousands separators
//! ("1,234,500"). Non-numeric placeholders such as "-" become NaN, which the
//! factor layer treats as a missing observation.

use crate::domain::Bar;
use chrono::NaiveDate;
use serde::Deserialize;

/// Full-market daily trades report (`MDCSTAT01501`).
#[derive(Debug, Deserialize)]
pub(crate) struct StockReport {
    #[serde(rename = "OutBlock_1")]
    pub rows: Vec<StockRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StockRow {
    #[serde(rename = "ISU_SRT_CD")]
    pub code: String,
    #[serde(rename = "TDD_OPNPRC", default)]
    pub open: String,
    #[serde(rename = "TDD_HGPRC", default)]
    pub high: String,
    #[serde(rename = "TDD_LWPRC", default)]
    pub low: String,
    #[serde(rename = "TDD_CLSPRC", default)]
    pub close: String,
    #[serde(rename = "ACC_TRDVOL", default)]
    pub volume: String,
    #[serde(rename = "ACC_TRDVAL", default)]
    pub volume_valued: String,
}

/// Index family daily report (`MDCSTAT00101`).
#[derive(Debug, Deserialize)]
pub(crate) struct IndexReport {
    pub output: Vec<IndexRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IndexRow {
    #[serde(rename = "IDX_NM")]
    pub name: String,
    #[serde(rename = "OPNPRC_IDX", default)]
    pub open: String,
    #[serde(rename = "HGPRC_IDX", default)]
    pub high: String,
    #[serde(rename = "LWPRC_IDX", default)]
    pub low: String,
    #[serde(rename = "CLSPRC_IDX", default)]
    pub close: String,
    #[serde(rename = "ACC_TRDVOL", default)]
    pub volume: String,
    #[serde(rename = "ACC_TRDVAL", default)]
    pub volume_valued: String,
}

/// Holiday calendar response.
#[derive(Debug, Deserialize)]
pub(crate) struct HolidayReport {
    pub block1: Vec<HolidayRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HolidayRow {
    pub calnd_dd_dy: String,
}

/// "1,234.5" -> 1234.5; anything unparseable -> NaN.
pub fn parse_number(raw: &str) -> f64 {
    raw.trim().replace(',', "").parse().unwrap_or(f64::NAN)
}

impl StockRow {
    pub fn into_bar(self, date: NaiveDate) -> Bar {
        Bar {
            date,
            symbol: self.code,
            open: parse_number(&self.open),
            high: parse_number(&self.high),
            low: parse_number(&self.low),
            close: parse_number(&self.close),
            volume: parse_number(&self.volume),
            volume_valued: parse_number(&self.volume_valued),
        }
    }
}

impl IndexRow {
    pub fn into_bar(self, date: NaiveDate, code: &str) -> Bar {
        Bar {
            date,
            symbol: code.to_string(),
            open: parse_number(&self.open),
            high: parse_number(&self.high),
            low: parse_number(&self.low),
            close: parse_number(&self.close),
            volume: parse_number(&self.volume),
            volume_valued: parse_number(&self.volume_valued),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(parse_number("1,234,500"), 1_234_500.0);
        assert_eq!(parse_number(" 2,650.31 "), 2650.31);
        assert!(parse_number("-").is_nan());
        assert!(parse_number("").is_nan());
    }

    #[test]
    fn stock_row_maps_to_bar() {
        let report: StockReport = serde_json::from_str(
            r#"{"OutBlock_1":[{
                "ISU_SRT_CD":"005930","ISU_ABBRV":"삼성전자","MKT_NM":"KOSPI",
                "TDD_CLSPRC":"71,000","TDD_OPNPRC":"70,500","TDD_HGPRC":"71,200",
                "TDD_LWPRC":"70,100","ACC_TRDVOL":"12,345,678","ACC_TRDVAL":"876,543,210,000"
            }]}"#,
        )
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let bar = report.rows.into_iter().next().unwrap().into_bar(date);
        assert_eq!(bar.symbol, "005930");
        assert_eq!(bar.date, date);
        assert_eq!(bar.open, 70_500.0);
        assert_eq!(bar.close, 71_000.0);
        assert_eq!(bar.volume, 12_345_678.0);
        assert_eq!(bar.volume_valued, 876_543_210_000.0);
    }

    #[test]
    fn missing_block_is_an_error() {
        assert!(serde_json::from_str::<IndexReport>(r#"{"OutBlock_1":[]}"#).is_err());
    }
}
