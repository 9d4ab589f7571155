//! State abbreviation to full-name reference.

use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use reqwest::blocking::Client;

use crate::error::{LendcleanError, Result};
use crate::table::{Column, Dataset, Value};

/// Public classification page listing US states and their abbreviations.
pub const DEFAULT_STATES_URL: &str =
    "https://www23.statcan.gc.ca/imdb/p3VD.pl?Function=getVD&TVD=53971";

/// Mapping from 2-letter code to full name.
pub type StateNames = HashMap<String, String>;

/// Built-in table: the 50 states, the District of Columbia, and inhabited territories.
const STATIC_STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
    ("AS", "American Samoa"),
    ("GU", "Guam"),
    ("MP", "Northern Mariana Islands"),
    ("PR", "Puerto Rico"),
    ("VI", "United States Virgin Islands"),
];

static TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<table[^>]*>(.*?)</table>").expect("table pattern is valid"));
static ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("row pattern is valid"));
static CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<td[^>]*>(.*?)</td>").expect("cell pattern is valid"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Something that can produce the state-name mapping.
pub trait StateNameResolver {
    fn resolve_state_names(&self) -> Result<StateNames>;

    /// Short name for logs.
    fn source_name(&self) -> &str;
}

/// The built-in table; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticStateNames;

impl StaticStateNames {
    pub fn table() -> StateNames {
        STATIC_STATES
            .iter()
            .map(|(code, name)| (code.to_string(), name.to_string()))
            .collect()
    }
}

impl StateNameResolver for StaticStateNames {
    fn resolve_state_names(&self) -> Result<StateNames> {
        Ok(Self::table())
    }

    fn source_name(&self) -> &str {
        "static"
    }
}

/// Fetches the classification page and reads its first table.
pub struct WebStateNames {
    client: Client,
    url: String,
}

impl WebStateNames {
    /// Create a resolver whose request gives up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LendcleanError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl StateNameResolver for WebStateNames {
    fn resolve_state_names(&self) -> Result<StateNames> {
        let response = self.client.get(&self.url).send()?;
        if !response.status().is_success() {
            return Err(LendcleanError::Reference(format!(
                "GET {} returned {}",
                self.url,
                response.status()
            )));
        }
        let body = response.text()?;
        parse_state_table(&body)
    }

    fn source_name(&self) -> &str {
        &self.url
    }
}

/// Resolves once and serves the same mapping afterwards.
pub struct CachedStateNames<R> {
    inner: R,
    cache: OnceCell<StateNames>,
}

impl<R: StateNameResolver> CachedStateNames<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: OnceCell::new(),
        }
    }
}

impl<R: StateNameResolver> StateNameResolver for CachedStateNames<R> {
    fn resolve_state_names(&self) -> Result<StateNames> {
        self.cache
            .get_or_try_init(|| self.inner.resolve_state_names())
            .cloned()
    }

    fn source_name(&self) -> &str {
        self.inner.source_name()
    }
}

/// Resolve with `primary`, falling back to the built-in table on failure.
pub fn resolve_or_static(primary: &dyn StateNameResolver) -> StateNames {
    match primary.resolve_state_names() {
        Ok(names) if !names.is_empty() => {
            tracing::info!(source = primary.source_name(), states = names.len(), "Resolved state names");
            names
        }
        Ok(_) => {
            tracing::warn!(
                source = primary.source_name(),
                "State reference was empty; using built-in table"
            );
            StaticStateNames::table()
        }
        Err(e) => {
            tracing::warn!(
                source = primary.source_name(),
                error = %e,
                "State reference unavailable; using built-in table"
            );
            StaticStateNames::table()
        }
    }
}

/// Read `abbreviation -> name` pairs from the first HTML table.
///
/// The header row is skipped; each data row carries the name in its first
/// cell and the abbreviation in its third.
pub fn parse_state_table(html: &str) -> Result<StateNames> {
    let table = TABLE
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| LendcleanError::Reference("No table found in page".to_string()))?;

    let mut names = StateNames::new();
    for row in ROW.captures_iter(table.as_str()).skip(1) {
        let Some(body) = row.get(1) else { continue };
        let cells: Vec<String> = CELL
            .captures_iter(body.as_str())
            .filter_map(|c| c.get(1))
            .map(|m| cell_text(m.as_str()))
            .collect();
        if cells.len() >= 3 && !cells[2].is_empty() {
            names.insert(cells[2].clone(), cells[0].clone());
        }
    }
    Ok(names)
}

fn cell_text(raw: &str) -> String {
    TAG.replace_all(raw, "")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Add `target` with the full name of each code in `state_column`.
///
/// Codes absent from `names` map to missing.
pub fn apply_state_names(
    dataset: Dataset,
    state_column: &str,
    target: &str,
    names: &StateNames,
) -> Result<Dataset> {
    let mut unmatched = 0usize;
    let full: Column = dataset
        .column(state_column)?
        .iter()
        .map(|code| match code {
            Value::Missing => Value::Missing,
            other => match names.get(&other.to_string()) {
                Some(name) => Value::text(name.clone()),
                None => {
                    unmatched += 1;
                    Value::Missing
                }
            },
        })
        .collect();
    if unmatched > 0 {
        tracing::warn!(column = state_column, unmatched, "State codes without a name");
    }
    dataset.with_column(target, full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const PAGE: &str = r##"
        <html><body>
        <table class="wb-tables">
          <tr><th>State</th><th>Code</th><th>Abbreviation</th></tr>
          <tr><td>Alabama</td><td>01</td><td>AL</td></tr>
          <tr><td><a href="#">New&nbsp;York</a></td><td>36</td><td> NY </td></tr>
          <tr><td>Broken</td><td>99</td></tr>
        </table>
        <table><tr><td>Other</td><td>0</td><td>ZZ</td></tr></table>
        </body></html>
    "##;

    #[test]
    fn test_parse_state_table() {
        let names = parse_state_table(PAGE).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names.get("AL").map(String::as_str), Some("Alabama"));
        assert_eq!(names.get("NY").map(String::as_str), Some("New York"));
        assert!(!names.contains_key("ZZ"));
    }

    #[test]
    fn test_parse_without_table() {
        assert!(parse_state_table("<p>nothing</p>").is_err());
    }

    /// Answer a single request with `response`, holding the connection for `hold` first.
    fn serve_once(response: String, hold: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 1024];
                let _ = stream.read(&mut request);
                thread::sleep(hold);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/states", addr)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn local_resolver(url: String, timeout: Duration) -> WebStateNames {
        let client = Client::builder().no_proxy().timeout(timeout).build().unwrap();
        WebStateNames { client, url }
    }

    #[test]
    fn test_web_resolves_page() {
        let url = serve_once(http_response("200 OK", PAGE), Duration::ZERO);
        let web = local_resolver(url, Duration::from_secs(5));
        let names = web.resolve_state_names().unwrap();
        assert_eq!(names.get("NY").map(String::as_str), Some("New York"));
    }

    #[test]
    fn test_web_server_error_falls_back() {
        let url = serve_once(http_response("500 Internal Server Error", ""), Duration::ZERO);
        let web = local_resolver(url, Duration::from_secs(5));

        let err = web.resolve_state_names().unwrap_err();
        assert!(matches!(err, LendcleanError::Reference(msg) if msg.contains("500")));

        let url = serve_once(http_response("500 Internal Server Error", ""), Duration::ZERO);
        let web = local_resolver(url, Duration::from_secs(5));
        assert_eq!(resolve_or_static(&web), StaticStateNames::table());
    }

    #[test]
    fn test_web_timeout_falls_back() {
        let url = serve_once(http_response("200 OK", PAGE), Duration::from_secs(3));
        let web = local_resolver(url, Duration::from_millis(200));
        assert_eq!(resolve_or_static(&web), StaticStateNames::table());
    }

    #[test]
    fn test_static_table() {
        let names = StaticStateNames::table();
        assert_eq!(names.get("CA").map(String::as_str), Some("California"));
        assert!(names.len() >= 51);
    }

    struct Failing;

    impl StateNameResolver for Failing {
        fn resolve_state_names(&self) -> Result<StateNames> {
            Err(LendcleanError::Reference("offline".to_string()))
        }

        fn source_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_fallback_to_static() {
        let names = resolve_or_static(&Failing);
        assert_eq!(names, StaticStateNames::table());
    }

    struct Counting(Cell<usize>);

    impl StateNameResolver for Counting {
        fn resolve_state_names(&self) -> Result<StateNames> {
            self.0.set(self.0.get() + 1);
            Ok(StateNames::from([("NY".to_string(), "New York".to_string())]))
        }

        fn source_name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_cached_resolves_once() {
        let cached = CachedStateNames::new(Counting(Cell::new(0)));
        cached.resolve_state_names().unwrap();
        cached.resolve_state_names().unwrap();
        assert_eq!(cached.inner.0.get(), 1);
    }

    #[test]
    fn test_apply_state_names() {
        let ds = Dataset::from_columns([(
            "state",
            Column::new(vec![Value::text("NY"), Value::text("XX"), Value::Missing]),
        )])
        .unwrap();
        let names = StaticStateNames::table();
        let ds = apply_state_names(ds, "state", "state_name", &names).unwrap();
        assert_eq!(
            ds.column("state_name").unwrap().values(),
            &[Value::text("New York"), Value::Missing, Value::Missing]
        );
    }
}
