//! KRX endpoint configuration (`[krx]` in the config file).

use serde::{Deserialize, Serialize};

/// Index series kept from the index report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexSeries {
    /// Market class sent as `idxIndMidclssCd` (02: KOSPI, 03: KOSDAQ).
    pub class_code: String,
    /// Value of `IDX_NM` to keep.
    pub name: String,
    /// Symbol the series is stored under.
    pub code: String,
}

impl Default for IndexSeries {
    fn default() -> Self {
        Self {
            class_code: "02".to_string(),
            name: "코스피".to_string(),
            code: "kospi".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KrxConfig {
    /// Host of the OTP generator and the holiday calendar.
    pub open_base_url: String,
    /// Host of the report endpoint.
    pub data_base_url: String,
    pub otp_path: String,
    pub holiday_path: String,
    /// Page the holiday calendar is served from; also sent as `pagePath`.
    pub holiday_page_path: String,
    /// Report template the holiday OTP is scoped to.
    pub holiday_otp_bld: String,
    pub data_path: String,
    pub data_referer: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub index: IndexSeries,
}

impl Default for KrxConfig {
    fn default() -> Self {
        Self {
            open_base_url: "http://open.krx.co.kr".to_string(),
            data_base_url: "http://data.krx.co.kr".to_string(),
            otp_path: "/contents/COM/GenerateOTP.jspx".to_string(),
            holiday_path: "/contents/OPN/99/OPN99000001.jspx".to_string(),
            holiday_page_path: "contents/MKD/01/0110/01100305/MKD01100305".to_string(),
            holiday_otp_bld: "MKD/01/0110/01100305/mkd01100305_01".to_string(),
            data_path: "/comm/bldAttendant/getJsonData.cmd".to_string(),
            data_referer:
                "http://data.krx.co.kr/contents/MDC/MDI/mdiLoader/index.cmd?menuId=MDC0201"
                    .to_string(),
            user_agent: "Mozilla/5.0 (compatible; factorlab)".to_string(),
            timeout_secs: 30,
            index: IndexSeries::default(),
        }
    }
}

impl KrxConfig {
    /// Point both hosts at `base_url` (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.open_base_url = base_url.clone();
        self.data_base_url = base_url;
        self
    }

    pub(crate) fn otp_url(&self) -> String {
        format!("{}{}", self.open_base_url, self.otp_path)
    }

    pub(crate) fn holiday_url(&self) -> String {
        format!("{}{}", self.open_base_url, self.holiday_path)
    }

    pub(crate) fn holiday_referer(&self) -> String {
        format!("{}/{}.jsp", self.open_base_url, self.holiday_page_path)
    }

    pub(crate) fn data_url(&self) -> String {
        format!("{}{}", self.data_base_url, self.data_path)
    }
}
