//! Date-indexed numeric series.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub date: NaiveDate,
    pub value: f64,
}

/// A named, strictly date-ordered sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn from_parts(name: impl Into<String>, dates: &[NaiveDate], values: &[f64]) -> Self {
        let points = dates
            .iter()
            .zip(values)
            .map(|(&date, &value)| Point { date, value })
            .collect();
        Self::new(name, points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.points.iter().map(|p| p.value).reduce(f64::min)
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }
}

/// Daily returns plus the price date that precedes the first return.
///
/// The base date anchors the equity curve at 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub base_date: NaiveDate,
    pub series: Series,
}

impl ReturnSeries {
    pub fn new(base_date: NaiveDate, series: Series) -> Self {
        Self { base_date, series }
    }

    pub fn name(&self) -> &str {
        &self.series.name
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.series.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.series.values()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.series.dates()
    }
}
