use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBucket {
    Under20,
    From20To40,
    From40To60,
    Over60,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 4] = [
        AgeBucket::Under20,
        AgeBucket::From20To40,
        AgeBucket::From40To60,
        AgeBucket::Over60,
    ];

    /// `40-60` is inclusive of 60; the other upper bounds are exclusive.
    pub fn for_age(age: i64) -> Self {
        match age {
            i64::MIN..=19 => AgeBucket::Under20,
            20..=39 => AgeBucket::From20To40,
            40..=60 => AgeBucket::From40To60,
            _ => AgeBucket::Over60,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBucket::Under20 => "<20",
            AgeBucket::From20To40 => "20-40",
            AgeBucket::From40To60 => "40-60",
            AgeBucket::Over60 => ">60",
        }
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per bucket, serialized with the bucket labels as keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketValues<T> {
    #[serde(rename = "<20")]
    pub under_20: T,
    #[serde(rename = "20-40")]
    pub from_20_to_40: T,
    #[serde(rename = "40-60")]
    pub from_40_to_60: T,
    #[serde(rename = ">60")]
    pub over_60: T,
}

impl<T> BucketValues<T> {
    pub fn get(&self, bucket: AgeBucket) -> &T {
        match bucket {
            AgeBucket::Under20 => &self.under_20,
            AgeBucket::From20To40 => &self.from_20_to_40,
            AgeBucket::From40To60 => &self.from_40_to_60,
            AgeBucket::Over60 => &self.over_60,
        }
    }

    fn get_mut(&mut self, bucket: AgeBucket) -> &mut T {
        match bucket {
            AgeBucket::Under20 => &mut self.under_20,
            AgeBucket::From20To40 => &mut self.from_20_to_40,
            AgeBucket::From40To60 => &mut self.from_40_to_60,
            AgeBucket::Over60 => &mut self.over_60,
        }
    }

    fn map<U>(&self, f: impl Fn(&T) -> U) -> BucketValues<U> {
        BucketValues {
            under_20: f(&self.under_20),
            from_20_to_40: f(&self.from_20_to_40),
            from_40_to_60: f(&self.from_40_to_60),
            over_60: f(&self.over_60),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeDistribution {
    pub counts: BucketValues<usize>,
    /// Two-decimal percentages of `total`.
    pub percentages: BucketValues<String>,
    /// Number of ages actually bucketed.
    pub total: usize,
}

impl AgeDistribution {
    pub fn rows(&self) -> Vec<Vec<String>> {
        AgeBucket::ALL
            .iter()
            .map(|bucket| {
                vec![
                    bucket.label().to_string(),
                    self.counts.get(*bucket).to_string(),
                    format!("{}%", self.percentages.get(*bucket)),
                ]
            })
            .collect()
    }
}

/// Buckets every age; `None` entries are skipped and left out of `total`.
pub fn bucket_ages(ages: &[Option<i64>]) -> AgeDistribution {
    let mut counts = BucketValues::<usize>::default();
    let mut total = 0usize;
    for (idx, age) in ages.iter().enumerate() {
        match age {
            Some(age) => {
                *counts.get_mut(AgeBucket::for_age(*age)) += 1;
                total += 1;
            }
            None => warn!("Skipping unparseable age at position {idx}"),
        }
    }
    let percentages = counts.map(|count| {
        let percent = if total == 0 {
            0.0
        } else {
            (*count as f64 / total as f64) * 100.0
        };
        format!("{percent:.2}")
    });
    AgeDistribution {
        counts,
        percentages,
        total,
    }
}
