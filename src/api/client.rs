//! Purpose: Provide the synchronous HTTP client for HAL patient registries.
//! Exports: `PatientClient`.
//! Role: Typed adapter between registry JSON and the record types in `model`.
//! Invariants: One HTTP request per operation; no retries, paging, or caching.
//! Invariants: Collection decoding is all-or-nothing and preserves server order.
#![allow(clippy::result_large_err)]

use crate::api::model::{Medication, Patient, Pharmacy, Physician, Resource, SubResource};
use crate::core::dispatch::Operation;
use crate::core::error::{Error, ErrorKind};
use crate::core::hal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

type ApiResult<T> = Result<T, Error>;

// The registry sorts the listing; the client never re-sorts.
const PATIENT_SORT: &str = "sort=lastName,asc";

#[derive(Clone)]
pub struct PatientClient {
    inner: Arc<PatientClientInner>,
}

struct PatientClientInner {
    base_url: Url,
    agent: ureq::Agent,
}

impl PatientClient {
    /// Build a client for the patient collection rooted at `base_url`.
    ///
    /// The base URL addresses the collection itself (for example
    /// `http://localhost:8080/patients`); member and sub-resource URLs are
    /// derived from it. A trailing slash is accepted and trimmed.
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(PatientClientInner { base_url, agent }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Fetch every patient, in the registry's lastName-ascending order.
    pub fn list_patients(&self) -> ApiResult<Vec<Patient>> {
        let url = self.list_url();
        let document = self.get_document(&url)?;
        let items = hal::embedded(&document, Patient::REL)
            .map_err(|err| err.with_url(url.as_str()))?;
        hal::decode_all(items).map_err(|err| err.with_url(url.as_str()))
    }

    /// Fetch one patient by identifier. Unknown identifiers are `NotFound`.
    pub fn patient(&self, id: i64) -> ApiResult<Patient> {
        let url = self.member_url(id)?;
        let document = self.get_document(&url)?;
        hal::decode(&document).map_err(|err| err.with_url(url.as_str()))
    }

    /// Persist `patient`, creating it when its id is the unsaved sentinel and
    /// replacing the existing record otherwise. The registry's response body
    /// is discarded; re-fetch to learn a server-assigned id.
    pub fn save_patient(&self, patient: &Patient) -> ApiResult<()> {
        match Operation::for_id(patient.id) {
            Operation::Create => {
                let url = self.inner.base_url.clone();
                self.send_record("POST", &url, patient)
            }
            Operation::Update { id } => {
                let url = self.member_url(id)?;
                self.send_record("PUT", &url, patient)
            }
        }
    }

    /// Delete the patient at `id`.
    pub fn delete_patient(&self, id: i64) -> ApiResult<()> {
        let url = self.member_url(id)?;
        self.delete(&url)
    }

    /// Fetch the medications recorded for one patient.
    pub fn medications(&self, patient_id: i64) -> ApiResult<Vec<Medication>> {
        self.sub_resources(patient_id)
    }

    /// Fetch the pharmacies recorded for one patient.
    pub fn pharmacies(&self, patient_id: i64) -> ApiResult<Vec<Pharmacy>> {
        self.sub_resources(patient_id)
    }

    /// Fetch the physicians recorded for one patient.
    pub fn physicians(&self, patient_id: i64) -> ApiResult<Vec<Physician>> {
        self.sub_resources(patient_id)
    }

    fn sub_resources<R>(&self, patient_id: i64) -> ApiResult<Vec<R>>
    where
        R: SubResource + DeserializeOwned,
    {
        let url = self.relation_url(patient_id, R::REL)?;
        let document = self.get_document(&url)?;
        let items =
            hal::embedded(&document, R::REL).map_err(|err| err.with_url(url.as_str()))?;
        hal::decode_all(items).map_err(|err| err.with_url(url.as_str()))
    }

    fn list_url(&self) -> Url {
        let mut url = self.inner.base_url.clone();
        url.set_query(Some(PATIENT_SORT));
        url
    }

    fn member_url(&self, id: i64) -> ApiResult<Url> {
        build_url(&self.inner.base_url, &[&id.to_string()])
    }

    fn relation_url(&self, id: i64, relation: &str) -> ApiResult<Url> {
        build_url(&self.inner.base_url, &[&id.to_string(), relation])
    }

    fn get_document(&self, url: &Url) -> ApiResult<Value> {
        debug!(url = %url, "GET");
        let response = self
            .inner
            .agent
            .request("GET", url.as_str())
            .set("Accept", "application/json")
            .call();
        match response {
            Ok(resp) => read_json_response(resp).map_err(|err| err.with_url(url.as_str())),
            Err(ureq::Error::Status(code, resp)) => {
                Err(parse_error_response(code, resp).with_url(url.as_str()))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Transport)
                .with_message("request failed")
                .with_url(url.as_str())
                .with_source(err)),
        }
    }

    fn send_record<T: Serialize>(&self, method: &str, url: &Url, record: &T) -> ApiResult<()> {
        debug!(url = %url, method, "send record");
        let payload = serde_json::to_string(record).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("failed to encode record json")
                .with_source(err)
        })?;
        let response = self
            .inner
            .agent
            .request(method, url.as_str())
            .set("Accept", "application/json")
            .set("Content-Type", "application/json")
            .send_string(&payload);
        match response {
            Ok(resp) => {
                let _ = resp.into_string();
                Ok(())
            }
            Err(ureq::Error::Status(code, resp)) => {
                Err(parse_error_response(code, resp).with_url(url.as_str()))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Transport)
                .with_message("request failed")
                .with_url(url.as_str())
                .with_source(err)),
        }
    }

    fn delete(&self, url: &Url) -> ApiResult<()> {
        debug!(url = %url, "DELETE");
        let response = self
            .inner
            .agent
            .request("DELETE", url.as_str())
            .set("Accept", "application/json")
            .call();
        match response {
            Ok(resp) => {
                let _ = resp.into_string();
                Ok(())
            }
            Err(ureq::Error::Status(code, resp)) => {
                Err(parse_error_response(code, resp).with_url(url.as_str()))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Transport)
                .with_message("request failed")
                .with_url(url.as_str())
                .with_source(err)),
        }
    }
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid registry base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("registry base url must use http or https scheme"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("registry base url must not include a query or fragment"));
    }
    if url.path().ends_with('/') && url.path() != "/" {
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }
    Ok(url)
}

fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("registry base url cannot be a base")
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_json_response(response: ureq::Response) -> ApiResult<Value> {
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Transport)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message("response body is not json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    let mut err = Error::new(error_kind_from_status(status))
        .with_message(format!("registry returned status {status}"))
        .with_status(status);
    if let Some(detail) = error_detail(&body) {
        err = err.with_hint(detail);
    }
    err
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        404 => ErrorKind::NotFound,
        _ => ErrorKind::Transport,
    }
}

// Registries commonly put a human-readable "message" field in error bodies.
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = value.get("message")?.as_str()?;
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
