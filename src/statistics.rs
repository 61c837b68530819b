// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::{error, proto};

/// Contains statistics for a specific column, for the entire file
/// or for a specific stripe.
#[derive(Debug, Clone)]
pub struct ColumnStatistics {
    number_of_values: u64,
    /// Used to aid in 'IS NULL' predicates
    has_null: bool,
    type_statistics: Option<TypeStatistics>,
}

impl ColumnStatistics {
    pub fn number_of_values(&self) -> u64 {
        self.number_of_values
    }

    pub fn has_null(&self) -> bool {
        self.has_null
    }

    pub fn type_statistics(&self) -> Option<&TypeStatistics> {
        self.type_statistics.as_ref()
    }
}

#[derive(Debug, Clone)]
pub enum TypeStatistics {
    /// For TinyInt, SmallInt, Int and BigInt
    Integer {
        /// Absent if the writer never set the field, not merely zero
        min: Option<i64>,
        max: Option<i64>,
        /// If sum overflows then recorded as None
        sum: Option<i64>,
    },
    /// For Float and Double
    Double {
        min: Option<f64>,
        max: Option<f64>,
        /// If sum overflows then recorded as None
        sum: Option<f64>,
    },
    String {
        /// Always present when the string statistics block is present
        min: String,
        max: String,
        /// Total length of all strings
        sum: Option<i64>,
    },
    /// For Boolean
    Bucket { true_count: u64 },
    Decimal {
        min: String,
        max: String,
        sum: String,
    },
    Date {
        /// Days since epoch
        min: Option<i32>,
        max: Option<i32>,
    },
    Binary {
        /// Total number of bytes across all values
        sum: Option<i64>,
    },
    Timestamp {
        /// Milliseconds since epoch, as recorded before ORC-135 (includes the
        /// writer's local timezone offset)
        min: i64,
        max: i64,
        /// Milliseconds since UNIX epoch, UTC
        min_utc: i64,
        max_utc: i64,
    },
    Collection {
        min_children: u64,
        max_children: u64,
        total_children: u64,
    },
}

impl TryFrom<&proto::ColumnStatistics> for ColumnStatistics {
    type Error = error::OrcError;

    fn try_from(value: &proto::ColumnStatistics) -> Result<Self, Self::Error> {
        let type_statistics = if let Some(stats) = &value.int_statistics {
            Some(TypeStatistics::Integer {
                min: stats.minimum,
                max: stats.maximum,
                sum: stats.sum,
            })
        } else if let Some(stats) = &value.double_statistics {
            Some(TypeStatistics::Double {
                min: stats.minimum,
                max: stats.maximum,
                sum: stats.sum,
            })
        } else if let Some(stats) = &value.string_statistics {
            Some(TypeStatistics::String {
                min: stats.minimum().to_owned(),
                max: stats.maximum().to_owned(),
                sum: stats.sum,
            })
        } else if let Some(stats) = &value.bucket_statistics {
            Some(TypeStatistics::Bucket {
                true_count: stats.count.first().copied().unwrap_or(0),
            })
        } else if let Some(stats) = &value.decimal_statistics {
            Some(TypeStatistics::Decimal {
                min: stats.minimum().to_owned(),
                max: stats.maximum().to_owned(),
                sum: stats.sum().to_owned(),
            })
        } else if let Some(stats) = &value.date_statistics {
            Some(TypeStatistics::Date {
                min: stats.minimum,
                max: stats.maximum,
            })
        } else if let Some(stats) = &value.binary_statistics {
            Some(TypeStatistics::Binary { sum: stats.sum })
        } else if let Some(stats) = &value.timestamp_statistics {
            Some(TypeStatistics::Timestamp {
                min: stats.minimum(),
                max: stats.maximum(),
                min_utc: stats.minimum_utc(),
                max_utc: stats.maximum_utc(),
            })
        } else {
            value
                .collection_statistics
                .as_ref()
                .map(|stats| TypeStatistics::Collection {
                    min_children: stats.min_children(),
                    max_children: stats.max_children(),
                    total_children: stats.total_children(),
                })
        };
        Ok(Self {
            number_of_values: value.number_of_values(),
            has_null: value.has_null(),
            type_statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_statistics_round_trip() {
        let proto = proto::ColumnStatistics {
            number_of_values: Some(10),
            has_null: Some(true),
            int_statistics: Some(proto::IntegerStatistics {
                minimum: Some(-5),
                maximum: Some(100),
                sum: Some(200),
            }),
            ..Default::default()
        };
        let stats = ColumnStatistics::try_from(&proto).unwrap();
        assert_eq!(stats.number_of_values(), 10);
        assert!(stats.has_null());
        match stats.type_statistics().unwrap() {
            TypeStatistics::Integer { min, max, sum } => {
                assert_eq!(*min, Some(-5));
                assert_eq!(*max, Some(100));
                assert_eq!(*sum, Some(200));
            }
            other => panic!("unexpected statistics variant: {other:?}"),
        }
    }

    #[test]
    fn no_type_statistics_present() {
        let proto = proto::ColumnStatistics {
            number_of_values: Some(0),
            has_null: Some(false),
            ..Default::default()
        };
        let stats = ColumnStatistics::try_from(&proto).unwrap();
        assert!(stats.type_statistics().is_none());
    }

    #[test]
    fn bucket_statistics_read_true_count() {
        let proto = proto::ColumnStatistics {
            number_of_values: Some(4),
            bucket_statistics: Some(proto::BucketStatistics { count: vec![3] }),
            ..Default::default()
        };
        let stats = ColumnStatistics::try_from(&proto).unwrap();
        match stats.type_statistics().unwrap() {
            TypeStatistics::Bucket { true_count } => assert_eq!(*true_count, 3),
            other => panic!("unexpected statistics variant: {other:?}"),
        }
    }

    #[test]
    fn string_statistics_omit_absent_sum() {
        let proto = proto::ColumnStatistics {
            number_of_values: Some(2),
            string_statistics: Some(proto::StringStatistics {
                minimum: Some("a".to_string()),
                maximum: Some("z".to_string()),
                sum: None,
            }),
            ..Default::default()
        };
        let stats = ColumnStatistics::try_from(&proto).unwrap();
        match stats.type_statistics().unwrap() {
            TypeStatistics::String { min, max, sum } => {
                assert_eq!(min, "a");
                assert_eq!(max, "z");
                assert_eq!(*sum, None);
            }
            other => panic!("unexpected statistics variant: {other:?}"),
        }
    }

    #[test]
    fn integer_statistics_omit_unset_min_max() {
        let proto = proto::ColumnStatistics {
            number_of_values: Some(1),
            int_statistics: Some(proto::IntegerStatistics {
                minimum: None,
                maximum: None,
                sum: Some(0),
            }),
            ..Default::default()
        };
        let stats = ColumnStatistics::try_from(&proto).unwrap();
        match stats.type_statistics().unwrap() {
            TypeStatistics::Integer { min, max, .. } => {
                assert_eq!(*min, None);
                assert_eq!(*max, None);
            }
            other => panic!("unexpected statistics variant: {other:?}"),
        }
    }
}
