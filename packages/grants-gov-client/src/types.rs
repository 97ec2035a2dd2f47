use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Request body for `search2`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub keyword: String,
    /// Pipe-separated statuses, e.g. `forecasted|posted`.
    pub opp_statuses: String,
    pub start_record_num: u32,
    pub rows: u32,
}

impl SearchRequest {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            opp_statuses: "forecasted|posted".to_string(),
            start_record_num: 0,
            rows: 100,
        }
    }

    pub fn page(mut self, start: u32, rows: u32) -> Self {
        self.start_record_num = start;
        self.rows = rows;
        self
    }
}

/// Request body for `fetchOpportunity`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOpportunityRequest {
    pub opportunity_id: u64,
}

/// Envelope around every Grants.gov response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub errorcode: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// `data` section of a `search2` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub hit_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub opp_hits: Vec<OpportunityHit>,
}

/// One hit from `search2`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityHit {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub opportunity_title: Option<String>,
    #[serde(default)]
    pub agency_code: Option<String>,
    #[serde(default)]
    pub agency_name: Option<String>,
    #[serde(default)]
    pub open_date: Option<String>,
    #[serde(default)]
    pub posted_date: Option<String>,
    #[serde(default)]
    pub close_date: Option<String>,
    #[serde(default)]
    pub opp_status: Option<String>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alnist: Vec<String>,
}

impl OpportunityHit {
    /// Title, falling back to `opportunityTitle`.
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.opportunity_title.as_deref())
    }

    /// Open date, falling back to the posted date.
    pub fn opened(&self) -> Option<&str> {
        self.open_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(self.posted_date.as_deref())
    }
}

/// `data` section of a `fetchOpportunity` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityDetail {
    #[serde(default)]
    pub synopsis: Option<Synopsis>,
    #[serde(default)]
    pub forecast: Option<Forecast>,
    #[serde(default)]
    pub agency_details: Option<AgencyDetails>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alns: Vec<Aln>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Synopsis {
    #[serde(default)]
    pub synopsis_desc: Option<String>,
    #[serde(default)]
    pub opportunity_description: Option<String>,
    #[serde(default)]
    pub agency_name: Option<String>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub funding_instruments: Vec<Described>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub funding_activity_categories: Vec<Described>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub applicant_types: Vec<Described>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    #[serde(default)]
    pub forecast_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencyDetails {
    #[serde(default)]
    pub agency_name: Option<String>,
}

/// A coded value with a human-readable description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Described {
    #[serde(default)]
    pub description: Option<String>,
}

/// Assistance Listing Number entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aln {
    #[serde(default)]
    pub aln_number: Option<String>,
}

impl OpportunityDetail {
    /// Raw (possibly HTML) description: synopsis, then forecast.
    pub fn raw_description(&self) -> Option<&str> {
        let synopsis = self.synopsis.as_ref();
        synopsis
            .and_then(|s| non_empty(s.synopsis_desc.as_deref()))
            .or_else(|| synopsis.and_then(|s| non_empty(s.opportunity_description.as_deref())))
            .or_else(|| {
                self.forecast
                    .as_ref()
                    .and_then(|f| non_empty(f.forecast_description.as_deref()))
            })
    }

    /// Agency name from the synopsis, else the agency details.
    pub fn agency_name(&self) -> Option<&str> {
        self.synopsis
            .as_ref()
            .and_then(|s| non_empty(s.agency_name.as_deref()))
            .or_else(|| {
                self.agency_details
                    .as_ref()
                    .and_then(|a| non_empty(a.agency_name.as_deref()))
            })
    }

    /// Document type (synopsis/forecast), lowercased.
    pub fn status(&self) -> Option<String> {
        self.synopsis
            .as_ref()
            .and_then(|s| non_empty(s.doc_type.as_deref()))
            .or_else(|| non_empty(self.doc_type.as_deref()))
            .map(str::to_lowercase)
    }

    pub fn funding_instruments(&self) -> Vec<String> {
        self.synopsis
            .as_ref()
            .map(|s| descriptions(&s.funding_instruments))
            .unwrap_or_default()
    }

    pub fn funding_categories(&self) -> Vec<String> {
        self.synopsis
            .as_ref()
            .map(|s| descriptions(&s.funding_activity_categories))
            .unwrap_or_default()
    }

    pub fn eligibilities(&self) -> Vec<String> {
        self.synopsis
            .as_ref()
            .map(|s| descriptions(&s.applicant_types))
            .unwrap_or_default()
    }

    pub fn aln_numbers(&self) -> Vec<String> {
        self.alns
            .iter()
            .filter_map(|a| non_empty(a.aln_number.as_deref()).map(str::to_string))
            .collect()
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn descriptions(items: &[Described]) -> Vec<String> {
    items
        .iter()
        .filter_map(|d| non_empty(d.description.as_deref()).map(str::to_string))
        .collect()
}

/// Grants.gov sends `null` for empty lists.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Grants.gov returns IDs as strings in search and numbers elsewhere.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().map(|n| n.min(u32::MAX as u64) as u32).unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
