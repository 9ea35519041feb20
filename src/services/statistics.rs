//! Registration statistics: daily, weekly, and monthly series plus a summary.

// crates.io
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::HttpTransport,
	validate::ValidationErrors,
};

const QUERY_DAY: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// One bucket of a statistics series.
///
/// Daily buckets carry `date`, weekly ones `week`/`period`, and monthly ones
/// `month`/`month_name`; every bucket carries a `total` (also accepted as `count`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatPoint {
	/// Bucket day as sent by the server (`YYYY-MM-DD`, optionally followed by a time).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub date: Option<String>,
	/// Human-readable period label.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub period: Option<String>,
	/// ISO week number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub week: Option<u32>,
	/// Month number (1-12).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub month: Option<u32>,
	/// Month name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub month_name: Option<String>,
	/// Registrations in the bucket.
	#[serde(default, alias = "count")]
	pub total: u64,
	/// Fields this client does not model.
	#[serde(flatten)]
	pub extra: BTreeMap<String, JsonValue>,
}
impl StatPoint {
	/// Parses the leading `YYYY-MM-DD` of [`Self::date`].
	pub fn day(&self) -> Option<Date> {
		let raw = self.date.as_deref()?.get(..10)?;

		Date::parse(raw, &time::macros::format_description!("[year]-[month]-[day]")).ok()
	}
}

/// Ordered statistics series.
///
/// Deserializes from `{"statistics": [...], ...}` or from a bare array.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StatSeries {
	/// Buckets in server order.
	pub points: Vec<StatPoint>,
	/// Other top-level fields returned next to the series.
	pub extra: BTreeMap<String, JsonValue>,
}
impl StatSeries {
	/// Sum of all bucket totals.
	pub fn total(&self) -> u64 {
		self.points.iter().map(|point| point.total).sum()
	}

	/// Rounded mean bucket total; `0` for an empty series.
	pub fn average(&self) -> u64 {
		match self.points.len() as u64 {
			0 => 0,
			len => (self.total() + len / 2) / len,
		}
	}

	/// Largest bucket, if any.
	pub fn peak(&self) -> Option<&StatPoint> {
		self.points.iter().max_by_key(|point| point.total)
	}
}
impl<'de> Deserialize<'de> for StatSeries {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Repr {
			Wrapped {
				statistics: Vec<StatPoint>,
				#[serde(flatten)]
				extra: BTreeMap<String, JsonValue>,
			},
			Plain(Vec<StatPoint>),
		}

		Ok(match Repr::deserialize(deserializer)? {
			Repr::Wrapped { statistics, extra } => Self { points: statistics, extra },
			Repr::Plain(points) => Self { points, extra: BTreeMap::new() },
		})
	}
}

/// Aggregate counters from `/statistics/summary`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSummary {
	/// All users ever registered.
	pub total: u64,
	/// Users currently active.
	pub active: u64,
	/// Users currently soft-deleted.
	pub deleted: u64,
	/// Registrations today.
	pub today: u64,
	/// Registrations this week.
	pub this_week: u64,
	/// Registrations this month.
	pub this_month: u64,
	/// Fields this client does not model.
	#[serde(flatten)]
	pub extra: BTreeMap<String, JsonValue>,
}

/// All four statistics views fetched together.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StatsOverview {
	/// Daily series.
	pub daily: StatSeries,
	/// Weekly series.
	pub weekly: StatSeries,
	/// Monthly series.
	pub monthly: StatSeries,
	/// Summary counters.
	pub summary: StatsSummary,
}

/// Optional filters for the series endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsQuery {
	/// First day included.
	pub start_date: Option<Date>,
	/// Last day included.
	pub end_date: Option<Date>,
	/// Maximum number of buckets.
	pub limit: Option<u32>,
}
impl StatsQuery {
	/// Inclusive day range, rejected locally when `end` precedes `start`.
	pub fn range(start: Date, end: Date) -> Result<Self, ValidationErrors> {
		let mut errors = ValidationErrors::default();

		if end < start {
			errors.add("end_date", "End date must not precede the start date.");
		}

		errors.into_result()?;

		Ok(Self { start_date: Some(start), end_date: Some(end), limit: None })
	}

	/// Caps the number of buckets.
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);

		self
	}

	/// Encodes the filters as query pairs with `YYYY-MM-DD` dates.
	pub fn to_pairs(&self) -> Result<Vec<(String, String)>> {
		let mut pairs = Vec::new();

		if let Some(start) = self.start_date {
			pairs.push(("start_date".into(), ymd(start)?));
		}
		if let Some(end) = self.end_date {
			pairs.push(("end_date".into(), ymd(end)?));
		}
		if let Some(limit) = self.limit {
			pairs.push(("limit".into(), limit.to_string()));
		}

		Ok(pairs)
	}
}

fn ymd(date: Date) -> Result<String> {
	date.format(QUERY_DAY).map_err(|e| Error::Encode { message: e.to_string() })
}

/// `/statistics` resource.
pub struct StatisticsService<T>
where
	T: ?Sized + HttpTransport,
{
	client: ApiClient<T>,
}
impl<T> StatisticsService<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps `client`.
	pub fn new(client: ApiClient<T>) -> Self {
		Self { client }
	}

	/// Daily registrations.
	pub async fn daily(&self, query: &StatsQuery) -> Result<StatSeries> {
		self.series("/statistics/daily", query).await
	}

	/// Weekly registrations.
	pub async fn weekly(&self, query: &StatsQuery) -> Result<StatSeries> {
		self.series("/statistics/weekly", query).await
	}

	/// Monthly registrations.
	pub async fn monthly(&self, query: &StatsQuery) -> Result<StatSeries> {
		self.series("/statistics/monthly", query).await
	}

	/// Summary counters.
	pub async fn summary(&self) -> Result<StatsSummary> {
		self.client.get("/statistics/summary").await?.into_data()
	}

	/// Fetches every view concurrently; the first failure cancels the rest.
	pub async fn all(&self) -> Result<StatsOverview> {
		let query = StatsQuery::default();
		let (daily, weekly, monthly, summary) = futures::try_join!(
			self.daily(&query),
			self.weekly(&query),
			self.monthly(&query),
			self.summary(),
		)?;

		Ok(StatsOverview { daily, weekly, monthly, summary })
	}

	/// Daily registrations between `start` and `end`, inclusive.
	pub async fn by_date_range(&self, start: Date, end: Date) -> Result<StatSeries> {
		self.daily(&StatsQuery::range(start, end)?).await
	}

	async fn series(&self, path: &str, query: &StatsQuery) -> Result<StatSeries> {
		self.client.get_with_query(path, query.to_pairs()?).await?.into_data()
	}
}
impl<T> Clone for StatisticsService<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { client: self.client.clone() }
	}
}
