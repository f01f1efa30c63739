use bytes::Bytes;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepotError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store rejected request ({status}): {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("store returned an incomplete response")]
    Incomplete,
}

/// Handle to the hosted data store. Cheap to clone is not needed; one
/// instance lives in the shared application state.
pub struct Depot {
    http: Client,
    base: String,
    key: String,
}

impl Depot {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            http: Client::new(),
            base: base_url.trim_end_matches('/').to_string(),
            key: service_key.to_string(),
        }
    }

    /// Start a row query against a table, supabase style:
    /// `depot.from("complaints").eq("user_id", id).fetch().await`.
    pub fn from<'a>(&'a self, table: &'a str) -> Rows<'a> {
        Rows {
            depot: self,
            table,
            filters: Vec::new(),
            order: None,
        }
    }

    /// Insert a single row and return the stored representation.
    pub async fn insert<T, R>(&self, table: &str, row: &T) -> Result<R, DepotError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let resp = self
            .request(Method::POST, self.rest(table))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        let rows: Vec<R> = ok(resp).await?.json().await?;
        rows.into_iter().next().ok_or(DepotError::Incomplete)
    }

    /// Upload an object into a storage bucket.
    pub async fn upload(
        &self,
        bucket: &str,
        object: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), DepotError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base, bucket, object);
        let resp = self
            .request(Method::POST, url)
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        ok(resp).await.map(|_| ())
    }

    /// Public URL for an uploaded object. The bucket must be public; the
    /// store serves these without authentication.
    pub fn public_url(&self, bucket: &str, object: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base, bucket, object)
    }

    fn rest(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }
}

/// A filtered row selection. Terminal methods issue the request.
pub struct Rows<'a> {
    depot: &'a Depot,
    table: &'a str,
    filters: Vec<(String, String)>,
    order: Option<String>,
}

impl<'a> Rows<'a> {
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(format!("{column}.desc"));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(format!("{column}.asc"));
        self
    }

    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, DepotError> {
        let resp = self
            .depot
            .request(Method::GET, self.url())
            .query(&self.pairs())
            .send()
            .await?;

        Ok(ok(resp).await?.json().await?)
    }

    /// First matching row, if any.
    pub async fn one<T: DeserializeOwned>(mut self) -> Result<Option<T>, DepotError> {
        self.filters.push(("limit".to_string(), "1".to_string()));
        let rows: Vec<T> = self.fetch().await?;
        Ok(rows.into_iter().next())
    }

    /// Exact row count without transferring rows.
    pub async fn count(self) -> Result<u64, DepotError> {
        let resp = self
            .depot
            .request(Method::GET, self.url())
            .query(&self.pairs())
            .header("Prefer", "count=exact")
            .header(header::RANGE, "0-0")
            .send()
            .await?;

        let resp = ok(resp).await?;
        resp.headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_total)
            .ok_or(DepotError::Incomplete)
    }

    /// Patch matching rows and return their stored representations.
    pub async fn update<T: DeserializeOwned>(
        self,
        patch: &serde_json::Value,
    ) -> Result<Vec<T>, DepotError> {
        let resp = self
            .depot
            .request(Method::PATCH, self.url())
            .query(&self.pairs())
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;

        Ok(ok(resp).await?.json().await?)
    }

    pub async fn delete(self) -> Result<(), DepotError> {
        let resp = self
            .depot
            .request(Method::DELETE, self.url())
            .query(&self.pairs())
            .send()
            .await?;

        ok(resp).await.map(|_| ())
    }

    fn url(&self) -> String {
        self.depot.rest(self.table)
    }

    fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filters.clone();
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        pairs
    }
}

async fn ok(resp: Response) -> Result<Response, DepotError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        let body = resp.text().await.unwrap_or_default();
        Err(DepotError::Rejected { status, body })
    }
}

/// The total sits after the slash: `0-0/42`, or `*/0` when nothing matches.
fn parse_total(content_range: &str) -> Option<u64> {
    content_range.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_become_query_pairs() {
        let depot = Depot::new("http://store.local/", "key");
        let rows = depot
            .from("complaints")
            .eq("user_id", "u1")
            .eq("status", "pending")
            .order_desc("created_at");

        assert_eq!(
            rows.pairs(),
            vec![
                ("user_id".to_string(), "eq.u1".to_string()),
                ("status".to_string(), "eq.pending".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let depot = Depot::new("http://store.local/", "key");
        assert_eq!(depot.rest("users"), "http://store.local/rest/v1/users");
        assert_eq!(
            depot.public_url("complaints", "images/a.jpg"),
            "http://store.local/storage/v1/object/public/complaints/images/a.jpg"
        );
    }

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_total("0-0/42"), Some(42));
        assert_eq!(parse_total("*/0"), Some(0));
        assert_eq!(parse_total("bogus"), None);
    }
}
