//! Descriptive statistics over any selection of cleaned events.
//!
//! Nothing here fails on small inputs: an empty selection yields zero counts
//! and sums, and `f64::NAN` wherever a mean, median, spread or correlation is
//! undefined.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::filter::View;
use super::model::CleanedEvent;

// ---------------------------------------------------------------------------
// Numeric fields
// ---------------------------------------------------------------------------

/// The continuous fields that take part in correlation analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericField {
    SeverityLevel,
    AffectedPopulation,
    EconomicLoss,
    ResponseTime,
    InfrastructureDamage,
}

impl NumericField {
    pub const ALL: [NumericField; 5] = [
        Self::SeverityLevel,
        Self::AffectedPopulation,
        Self::EconomicLoss,
        Self::ResponseTime,
        Self::InfrastructureDamage,
    ];

    /// Column name in the dataset files.
    pub fn column(self) -> &'static str {
        match self {
            Self::SeverityLevel => "severity_level",
            Self::AffectedPopulation => "affected_population",
            Self::EconomicLoss => "estimated_economic_loss_usd",
            Self::ResponseTime => "response_time_hours",
            Self::InfrastructureDamage => "infrastructure_damage_index",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SeverityLevel => "Severity",
            Self::AffectedPopulation => "Affected Population",
            Self::EconomicLoss => "Economic Loss",
            Self::ResponseTime => "Response Time",
            Self::InfrastructureDamage => "Infrastructure Damage",
        }
    }

    pub fn value(self, event: &CleanedEvent) -> f64 {
        let e = &event.event;
        match self {
            Self::SeverityLevel => e.severity_level as f64,
            Self::AffectedPopulation => e.affected_population as f64,
            Self::EconomicLoss => e.estimated_economic_loss_usd,
            Self::ResponseTime => e.response_time_hours,
            Self::InfrastructureDamage => e.infrastructure_damage_index,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Single-field statistics
// ---------------------------------------------------------------------------

/// Sum, centre and spread of one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
}

impl FieldStats {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        let sum: f64 = values.iter().sum();
        if count == 0 {
            return FieldStats {
                count,
                sum,
                mean: f64::NAN,
                median: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
                std_dev: f64::NAN,
            };
        }
        let mean = sum / count as f64;
        let std_dev = if count < 2 {
            f64::NAN
        } else {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        };
        FieldStats {
            count,
            sum,
            mean,
            median: median(values),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_dev,
        }
    }
}

/// Middle value, or the mean of the two middle values. NaN when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Mean of the values, NaN when empty.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pearson correlation coefficient.
///
/// NaN when there are fewer than two pairs or either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// One off-diagonal entry of the correlation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationPair {
    pub a: NumericField,
    pub b: NumericField,
    pub r: f64,
}

/// Symmetric 5x5 Pearson matrix over [`NumericField::ALL`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationMatrix {
    values: [[f64; 5]; 5],
}

impl CorrelationMatrix {
    pub fn compute(events: &[&CleanedEvent]) -> Self {
        let columns: Vec<Vec<f64>> = NumericField::ALL
            .iter()
            .map(|f| events.iter().map(|e| f.value(e)).collect())
            .collect();

        let mut values = [[f64::NAN; 5]; 5];
        for i in 0..5 {
            for j in i..5 {
                let r = pearson(&columns[i], &columns[j]);
                // exact 1.0 on the diagonal instead of rounding noise
                let r = if i == j && !r.is_nan() { 1.0 } else { r };
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        CorrelationMatrix { values }
    }

    pub fn get(&self, a: NumericField, b: NumericField) -> f64 {
        self.values[a.index()][b.index()]
    }

    /// The ten distinct pairs, strongest |r| first; undefined ones last.
    pub fn ranked_pairs(&self) -> Vec<CorrelationPair> {
        let mut pairs = Vec::with_capacity(10);
        for (i, &a) in NumericField::ALL.iter().enumerate() {
            for &b in &NumericField::ALL[i + 1..] {
                pairs.push(CorrelationPair {
                    a,
                    b,
                    r: self.get(a, b),
                });
            }
        }
        pairs.sort_by(|p, q| match (p.r.is_nan(), q.r.is_nan()) {
            (false, false) => q.r.abs().total_cmp(&p.r.abs()),
            (a, b) => a.cmp(&b),
        });
        pairs
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Headline metrics for a selection of events.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_events: usize,
    pub major_disasters: usize,
    pub affected_population: FieldStats,
    pub economic_loss: FieldStats,
    pub response_time: FieldStats,
    pub avg_severity: f64,
    pub avg_infrastructure_damage: f64,
    pub unique_locations: usize,
    pub unique_disaster_types: usize,
    /// Days between the earliest and latest event, `None` when empty.
    pub date_range_days: Option<i64>,
    /// Most frequent disaster type; ties go to the alphabetically first.
    pub most_common_type: Option<String>,
    pub correlations: CorrelationMatrix,
}

impl Summary {
    pub fn compute<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a CleanedEvent>,
    {
        let events: Vec<&CleanedEvent> = events.into_iter().collect();

        let field = |f: fn(&CleanedEvent) -> f64| -> Vec<f64> {
            events.iter().map(|e| f(e)).collect()
        };
        let affected = field(|e| e.event.affected_population as f64);
        let loss = field(|e| e.event.estimated_economic_loss_usd);
        let response = field(|e| e.event.response_time_hours);

        let mut locations = BTreeSet::new();
        let mut type_counts: HashMap<&str, usize> = HashMap::new();
        for e in &events {
            locations.insert(e.event.location.as_str());
            *type_counts.entry(e.event.disaster_type.as_str()).or_default() += 1;
        }
        let most_common_type = type_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(t, _)| t.to_string());

        let min_date = events.iter().map(|e| e.event.date).min();
        let max_date = events.iter().map(|e| e.event.date).max();
        let date_range_days = min_date
            .zip(max_date)
            .map(|(lo, hi)| (hi - lo).num_days());

        Summary {
            total_events: events.len(),
            major_disasters: events.iter().filter(|e| e.event.is_major_disaster).count(),
            affected_population: FieldStats::from_values(&affected),
            economic_loss: FieldStats::from_values(&loss),
            response_time: FieldStats::from_values(&response),
            avg_severity: mean(events.iter().map(|e| e.event.severity_level as f64)),
            avg_infrastructure_damage: mean(
                events.iter().map(|e| e.event.infrastructure_damage_index),
            ),
            unique_locations: locations.len(),
            unique_disaster_types: type_counts.len(),
            date_range_days,
            most_common_type,
            correlations: CorrelationMatrix::compute(&events),
        }
    }

    /// Share of events flagged as major, in percent. NaN when empty.
    pub fn major_share_pct(&self) -> f64 {
        if self.total_events == 0 {
            f64::NAN
        } else {
            self.major_disasters as f64 / self.total_events as f64 * 100.0
        }
    }

    /// Flat name → value mapping for display and export.
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        let mut m = BTreeMap::new();
        let mut put = |k: &str, v: f64| {
            m.insert(k.to_string(), v);
        };
        put("total_events", self.total_events as f64);
        put("major_disasters", self.major_disasters as f64);
        put("total_affected", self.affected_population.sum);
        put("avg_affected", self.affected_population.mean);
        put("median_affected", self.affected_population.median);
        put("total_economic_loss", self.economic_loss.sum);
        put("avg_economic_loss", self.economic_loss.mean);
        put("median_economic_loss", self.economic_loss.median);
        put("total_response_time", self.response_time.sum);
        put("avg_response_time", self.response_time.mean);
        put("median_response_time", self.response_time.median);
        put("avg_severity", self.avg_severity);
        put("avg_infrastructure_damage", self.avg_infrastructure_damage);
        put("unique_locations", self.unique_locations as f64);
        put("unique_disaster_types", self.unique_disaster_types as f64);
        put(
            "date_range_days",
            self.date_range_days.map_or(f64::NAN, |d| d as f64),
        );
        for pair in self.correlations.ranked_pairs() {
            put(&format!("corr:{}:{}", pair.a.column(), pair.b.column()), pair.r);
        }
        m
    }
}

/// Summary of the rows selected by `view`.
pub fn summarize(view: &View<'_>) -> Summary {
    Summary::compute(view.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterConfig, filter};
    use crate::data::fixtures::small_dataset;
    use crate::data::model::Dataset;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn summary_of_small_dataset() {
        let ds = small_dataset();
        let s = Summary::compute(ds.events());
        assert_eq!(s.total_events, 6);
        assert_eq!(s.major_disasters, 3);
        assert_eq!(s.affected_population.sum, 236_500.0);
        // sorted: 500 2000 4000 20000 60000 150000
        assert_eq!(s.affected_population.median, 12_000.0);
        assert!(close(s.response_time.mean, 181.0 / 6.0));
        assert_eq!(s.response_time.min, 3.0);
        assert_eq!(s.response_time.max, 80.0);
        assert_eq!(s.unique_locations, 3);
        assert_eq!(s.unique_disaster_types, 3);
        assert_eq!(s.date_range_days, Some(157));
        // three types with two events each: alphabetical tie-break
        assert_eq!(s.most_common_type.as_deref(), Some("Earthquake"));
        assert!(close(s.major_share_pct(), 50.0));
    }

    #[test]
    fn sums_match_manual_sums_over_a_view() {
        let ds = small_dataset();
        let mut config = FilterConfig::all(&ds);
        config.major_only = true;
        let view = filter(&ds, &config);
        let s = summarize(&view);
        let manual: i64 = view.iter().map(|e| e.event.affected_population).sum();
        assert_eq!(s.affected_population.sum, manual as f64);
        assert_eq!(s.total_events, view.len());
    }

    #[test]
    fn empty_view_yields_sentinels() {
        let ds = Dataset::from_events(Vec::new());
        let s = summarize(&View::full(&ds));
        assert_eq!(s.total_events, 0);
        assert_eq!(s.major_disasters, 0);
        assert_eq!(s.affected_population.sum, 0.0);
        assert!(s.affected_population.mean.is_nan());
        assert!(s.response_time.median.is_nan());
        assert!(s.avg_severity.is_nan());
        assert_eq!(s.date_range_days, None);
        assert_eq!(s.most_common_type, None);
        for pair in s.correlations.ranked_pairs() {
            assert!(pair.r.is_nan());
        }
        let m = s.metrics();
        assert_eq!(m["total_events"], 0.0);
        assert!(m["date_range_days"].is_nan());
    }

    #[test]
    fn single_row_correlation_is_undefined() {
        let ds = small_dataset();
        let s = Summary::compute(&ds.events()[..1]);
        assert!(s
            .correlations
            .get(NumericField::SeverityLevel, NumericField::ResponseTime)
            .is_nan());
        assert_eq!(s.date_range_days, Some(0));
    }

    #[test]
    fn pearson_known_values() {
        assert!(close(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 1.0));
        assert!(close(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), -1.0));
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!(pearson(&[1.0], &[1.0]).is_nan());
        // x = 1..4, y = 1,3,2,4  → r = 0.8
        assert!(close(pearson(&[1.0, 2.0, 3.0, 4.0], &[1.0, 3.0, 2.0, 4.0]), 0.8));
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let ds = small_dataset();
        let m = CorrelationMatrix::compute(&ds.events().iter().collect::<Vec<_>>());
        for a in NumericField::ALL {
            assert_eq!(m.get(a, a), 1.0);
            for b in NumericField::ALL {
                assert_eq!(m.get(a, b), m.get(b, a));
            }
        }
        let ranked = m.ranked_pairs();
        assert_eq!(ranked.len(), 10);
        assert!(ranked.windows(2).all(|w| w[0].r.abs() >= w[1].r.abs()));
        // severity tracks infrastructure damage closely in the fixture
        assert!(m.get(NumericField::SeverityLevel, NumericField::InfrastructureDamage) > 0.9);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn metric_keys_cover_every_pair() {
        let ds = small_dataset();
        let m = Summary::compute(ds.events()).metrics();
        assert_eq!(m.keys().filter(|k| k.starts_with("corr:")).count(), 10);
        assert!(m.contains_key("corr:severity_level:affected_population"));
        assert_eq!(m["unique_locations"], 3.0);
    }
}
