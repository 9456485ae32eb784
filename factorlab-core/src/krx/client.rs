//! HTTP client for the KRX data portal.
//!
//! Every request is authorized with a one-time OTP token fetched just before
//! it. No retries: any transport error, non-success status or malformed
//! payload surfaces as an error.

use super::config::KrxConfig;
use super::rows::{HolidayReport, IndexReport, StockReport};
use crate::domain::Bar;
use crate::error::{DataError, Result};
use chrono::{NaiveDate, Utc};
use reqwest::header::REFERER;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::time::Duration;

/// Full-market daily trades report.
pub const STOCK_REPORT_BLD: &str = "dbms/MDC/STAT/standard/MDCSTAT01501";
/// Index family daily report.
pub const INDEX_REPORT_BLD: &str = "dbms/MDC/STAT/standard/MDCSTAT00101";

#[derive(Debug, Clone)]
pub struct KrxClient {
    client: reqwest::Client,
    config: KrxConfig,
}

impl KrxClient {
    pub fn new(config: KrxConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DataError::RemoteRequestFailed(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Request an OTP token scoped to the report template `bld`.
    pub async fn generate_otp(&self, bld: &str, referer: &str) -> Result<String> {
        let url = self.config.otp_url();
        let stamp = Utc::now().timestamp_millis().to_string();
        tracing::debug!(bld = bld, url = %url, "requesting KRX OTP");

        let response = self
            .client
            .get(&url)
            .query(&[("bld", bld), ("name", "form"), ("_", stamp.as_str())])
            .header(REFERER, referer)
            .send()
            .await
            .map_err(|e| DataError::OtpAcquisitionFailed(format!("{bld}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::OtpAcquisitionFailed(format!(
                "{bld}: HTTP {status}"
            )));
        }

        let token = response
            .text()
            .await
            .map_err(|e| DataError::OtpAcquisitionFailed(format!("{bld}: {e}")))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(DataError::OtpAcquisitionFailed(format!(
                "{bld}: empty token"
            )));
        }
        Ok(token.to_string())
    }

    /// Exchange holidays of `year`.
    pub async fn fetch_holidays(&self, year: i32) -> Result<BTreeSet<NaiveDate>> {
        let referer = self.config.holiday_referer();
        let otp = self
            .generate_otp(&self.config.holiday_otp_bld, &referer)
            .await?;

        let year = year.to_string();
        let page_path = format!("{}.jsp", self.config.holiday_page_path);
        let form = [
            ("search_bas_yy", year.as_str()),
            ("gridTp", "KRX"),
            ("pagePath", page_path.as_str()),
            ("code", otp.as_str()),
        ];
        let report: HolidayReport = self
            .post_form(&self.config.holiday_url(), &referer, &form)
            .await?;

        let holidays = report
            .block1
            .iter()
            .map(|row| {
                NaiveDate::parse_from_str(&row.calnd_dd_dy, "%Y-%m-%d").map_err(|e| {
                    DataError::RemoteRequestFailed(format!(
                        "holiday date '{}': {e}",
                        row.calnd_dd_dy
                    ))
                })
            })
            .collect::<Result<BTreeSet<_>>>()?;

        tracing::info!(year = %year, count = holidays.len(), "KRX holidays loaded");
        Ok(holidays)
    }

    /// Every listed stock's bar for `date`.
    pub async fn fetch_stock_bars(&self, date: NaiveDate) -> Result<Vec<Bar>> {
        let trade_date = date.format("%Y%m%d").to_string();
        let report: StockReport = self
            .request_report(
                STOCK_REPORT_BLD,
                &[
                    ("locale", "ko_KR"),
                    ("mktId", "ALL"),
                    ("trdDd", trade_date.as_str()),
                    ("share", "1"),
                    ("money", "1"),
                    ("csvxls_isNo", "false"),
                ],
            )
            .await?;

        let bars: Vec<Bar> = report
            .rows
            .into_iter()
            .map(|row| row.into_bar(date))
            .collect();
        let untraded = bars.iter().filter(|b| b.is_void()).count();
        tracing::info!(
            date = %date,
            count = bars.len(),
            untraded,
            "KRX stock bars fetched"
        );
        Ok(bars)
    }

    /// The configured index series' bar for `date` (zero or one bar).
    pub async fn fetch_index_bars(&self, date: NaiveDate) -> Result<Vec<Bar>> {
        let trade_date = date.format("%Y%m%d").to_string();
        let series = &self.config.index;
        let report: IndexReport = self
            .request_report(
                INDEX_REPORT_BLD,
                &[
                    ("locale", "ko_KR"),
                    ("idxIndMidclssCd", series.class_code.as_str()),
                    ("trdDd", trade_date.as_str()),
                    ("share", "1"),
                    ("money", "1"),
                    ("csvxls_isNo", "false"),
                ],
            )
            .await?;

        let bars: Vec<Bar> = report
            .output
            .into_iter()
            .filter(|row| row.name == series.name)
            .map(|row| row.into_bar(date, &series.code))
            .collect();
        tracing::info!(
            date = %date,
            series = %series.code,
            count = bars.len(),
            "KRX index bars fetched"
        );
        Ok(bars)
    }

    async fn request_report<T: DeserializeOwned>(
        &self,
        bld: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let referer = self.config.data_referer.as_str();
        let otp = self.generate_otp(bld, referer).await?;

        let mut form: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 2);
        form.push(("bld", bld));
        form.extend_from_slice(params);
        form.push(("code", otp.as_str()));

        self.post_form(&self.config.data_url(), referer, &form).await
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        referer: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        tracing::debug!(url = %url, "KRX POST");

        let response = self
            .client
            .post(url)
            .header(REFERER, referer)
            .form(form)
            .send()
            .await
            .map_err(|e| DataError::RemoteRequestFailed(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::RemoteRequestFailed(format!(
                "{url}: HTTP {status} {body}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DataError::RemoteRequestFailed(format!("{url}: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| DataError::RemoteRequestFailed(format!("{url}: malformed payload: {e}")))
    }
}
