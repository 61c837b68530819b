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

use std::fmt::Display;

use snafu::{ensure, OptionExt};

use crate::error::{NoTypesSnafu, Result, UnexpectedSnafu};
use crate::proto;

/// Represents the root data type of the ORC file. Contains multiple named child types
/// which map to the columns available.
///
/// This is essentially a Struct type. Note that the ORC spec states the root type does
/// not necessarily have to be a Struct; this crate, like the file formats it has been
/// tested against, only supports a Struct root.
///
/// See: <https://orc.apache.org/docs/types.html>
#[derive(Debug, Clone)]
pub struct RootDataType {
    children: Vec<NamedColumn>,
}

impl RootDataType {
    /// Root column index is always 0.
    pub fn column_index(&self) -> usize {
        0
    }

    /// Base columns of the file.
    pub fn children(&self) -> &[NamedColumn] {
        &self.children
    }

    /// Construct from protobuf types.
    pub(crate) fn from_proto(types: &[proto::Type]) -> Result<Self> {
        ensure!(!types.is_empty(), NoTypesSnafu {});
        let children = parse_struct_children_from_proto(types, 0)?;
        Ok(Self { children })
    }
}

impl Display for RootDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "struct<")?;
        write_children(f, &self.children)?;
        write!(f, ">")
    }
}

#[derive(Debug, Clone)]
pub struct NamedColumn {
    name: String,
    data_type: DataType,
}

impl NamedColumn {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

fn write_children(f: &mut std::fmt::Formatter<'_>, children: &[NamedColumn]) -> std::fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}:{}", child.name(), child.data_type())?;
    }
    Ok(())
}

/// Helper function since this is duplicated for [`RootDataType`] and [`DataType::Struct`]
/// parsing from proto.
fn parse_struct_children_from_proto(
    types: &[proto::Type],
    column_index: usize,
) -> Result<Vec<NamedColumn>> {
    // These pre-conditions should always be upheld, especially as this is a private function
    assert!(column_index < types.len());
    let ty = &types[column_index];
    assert!(ty.kind() == proto::r#type::Kind::Struct);
    ensure!(
        ty.subtypes.len() == ty.field_names.len(),
        UnexpectedSnafu {
            msg: format!(
                "Struct type for column index {} must have matching lengths for subtypes and field names lists",
                column_index,
            )
        }
    );
    let children = ty
        .subtypes
        .iter()
        .zip(ty.field_names.iter())
        .map(|(&index, name)| {
            let index = index as usize;
            let name = name.to_owned();
            let data_type = DataType::from_proto(types, index)?;
            Ok(NamedColumn { name, data_type })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(children)
}

/// Represents the exact data types supported by ORC.
///
/// Each variant holds the column index in order to associate the type
/// with the specific column statistics present in the file/stripe footers.
#[derive(Debug, Clone)]
pub enum DataType {
    /// 1 bit packed data.
    Boolean { column_index: usize },
    /// 8 bit integer, also called TinyInt.
    Byte { column_index: usize },
    /// 16 bit integer, also called SmallInt.
    Short { column_index: usize },
    /// 32 bit integer.
    Int { column_index: usize },
    /// 64 bit integer, also called BigInt.
    Long { column_index: usize },
    /// 32 bit floating-point number.
    Float { column_index: usize },
    /// 64 bit floating-point number.
    Double { column_index: usize },
    /// UTF-8 encoded strings.
    String { column_index: usize },
    /// UTF-8 encoded strings, with an upper length limit on values.
    Varchar {
        column_index: usize,
        max_length: u32,
    },
    /// UTF-8 encoded strings, with an upper length limit on values.
    Char {
        column_index: usize,
        max_length: u32,
    },
    /// Arbitrary byte array values.
    Binary { column_index: usize },
    /// Decimal numbers with a fixed precision and scale.
    Decimal {
        column_index: usize,
        precision: u32,
        scale: u32,
    },
    /// Represents specific date and time, down to the nanosecond, with no timezone.
    Timestamp { column_index: usize },
    /// Represents specific date and time, down to the nanosecond, with timezone
    /// (a fixed instant in time, independent of the reader's timezone).
    TimestampWithLocalTimezone { column_index: usize },
    /// Represents specific date (without time) as days since the UNIX epoch.
    Date { column_index: usize },
    /// Compound type with named child subtypes, representing a structured
    /// collection of children types.
    Struct {
        column_index: usize,
        children: Vec<NamedColumn>,
    },
    /// Compound type where each value in the column is a list of values
    /// of another type, specified by the child type.
    List {
        column_index: usize,
        child: Box<DataType>,
    },
    /// Compound type with two children subtypes, key and value, representing
    /// key-value pairs for column values.
    Map {
        column_index: usize,
        key: Box<DataType>,
        value: Box<DataType>,
    },
    /// Compound type which can represent multiple types of data within
    /// the same column.
    Union {
        column_index: usize,
        variants: Vec<DataType>,
    },
}

impl DataType {
    /// Retrieve the column index of this data type, used for getting the specific column
    /// statistics present in the file.
    pub fn column_index(&self) -> usize {
        match self {
            DataType::Boolean { column_index } => *column_index,
            DataType::Byte { column_index } => *column_index,
            DataType::Short { column_index } => *column_index,
            DataType::Int { column_index } => *column_index,
            DataType::Long { column_index } => *column_index,
            DataType::Float { column_index } => *column_index,
            DataType::Double { column_index } => *column_index,
            DataType::String { column_index } => *column_index,
            DataType::Varchar { column_index, .. } => *column_index,
            DataType::Char { column_index, .. } => *column_index,
            DataType::Binary { column_index } => *column_index,
            DataType::Decimal { column_index, .. } => *column_index,
            DataType::Timestamp { column_index } => *column_index,
            DataType::TimestampWithLocalTimezone { column_index } => *column_index,
            DataType::Date { column_index } => *column_index,
            DataType::Struct { column_index, .. } => *column_index,
            DataType::List { column_index, .. } => *column_index,
            DataType::Map { column_index, .. } => *column_index,
            DataType::Union { column_index, .. } => *column_index,
        }
    }

    fn from_proto(types: &[proto::Type], column_index: usize) -> Result<Self> {
        use proto::r#type::Kind;

        let ty = types.get(column_index).context(UnexpectedSnafu {
            msg: format!("Column index out of bounds: {column_index}"),
        })?;
        let dt = match ty.kind() {
            Kind::Boolean => Self::Boolean { column_index },
            Kind::Byte => Self::Byte { column_index },
            Kind::Short => Self::Short { column_index },
            Kind::Int => Self::Int { column_index },
            Kind::Long => Self::Long { column_index },
            Kind::Float => Self::Float { column_index },
            Kind::Double => Self::Double { column_index },
            Kind::String => Self::String { column_index },
            Kind::Binary => Self::Binary { column_index },
            Kind::Timestamp => Self::Timestamp { column_index },
            Kind::List => {
                ensure!(
                    ty.subtypes.len() == 1,
                    UnexpectedSnafu {
                        msg: format!(
                            "List type for column index {} must have 1 sub type, found {}",
                            column_index,
                            ty.subtypes.len()
                        )
                    }
                );
                let child = ty.subtypes[0] as usize;
                let child = Box::new(Self::from_proto(types, child)?);
                Self::List {
                    column_index,
                    child,
                }
            }
            Kind::Map => {
                ensure!(
                    ty.subtypes.len() == 2,
                    UnexpectedSnafu {
                        msg: format!(
                            "Map type for column index {} must have 2 sub types, found {}",
                            column_index,
                            ty.subtypes.len()
                        )
                    }
                );
                let key = ty.subtypes[0] as usize;
                let key = Box::new(Self::from_proto(types, key)?);
                let value = ty.subtypes[1] as usize;
                let value = Box::new(Self::from_proto(types, value)?);
                Self::Map {
                    column_index,
                    key,
                    value,
                }
            }
            Kind::Struct => {
                let children = parse_struct_children_from_proto(types, column_index)?;
                Self::Struct {
                    column_index,
                    children,
                }
            }
            Kind::Union => {
                ensure!(
                    ty.subtypes.len() <= 127,
                    UnexpectedSnafu {
                        msg: format!(
                            "Union type for column index {} cannot exceed 127 variants, found {}",
                            column_index,
                            ty.subtypes.len()
                        )
                    }
                );
                let variants = ty
                    .subtypes
                    .iter()
                    .map(|&index| {
                        let index = index as usize;
                        Self::from_proto(types, index)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Self::Union {
                    column_index,
                    variants,
                }
            }
            Kind::Decimal => Self::Decimal {
                column_index,
                precision: ty.precision(),
                scale: ty.scale(),
            },
            Kind::Date => Self::Date { column_index },
            Kind::Varchar => Self::Varchar {
                column_index,
                max_length: ty.maximum_length(),
            },
            Kind::Char => Self::Char {
                column_index,
                max_length: ty.maximum_length(),
            },
            Kind::TimestampInstant => Self::TimestampWithLocalTimezone { column_index },
        };
        Ok(dt)
    }
}

/// Renders the Hive-style type signature used by Hive/Presto/Spark to describe
/// ORC schemas: lower-case primitive names (with `tinyint`/`bigint` standing in
/// for `SHORT`/`LONG`, matching the historical naming used by the format's own
/// tooling), bare names for decimal/varchar/char/date (no embedded precision or
/// length), and `kind<...>` for the four composite kinds, with struct children
/// prefixed by `fieldName:`.
impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Boolean { .. } => write!(f, "boolean"),
            DataType::Byte { .. } => write!(f, "byte"),
            DataType::Short { .. } => write!(f, "tinyint"),
            DataType::Int { .. } => write!(f, "int"),
            DataType::Long { .. } => write!(f, "bigint"),
            DataType::Float { .. } => write!(f, "float"),
            DataType::Double { .. } => write!(f, "double"),
            DataType::String { .. } => write!(f, "string"),
            DataType::Varchar { .. } => write!(f, "varchar"),
            DataType::Char { .. } => write!(f, "char"),
            DataType::Binary { .. } => write!(f, "binary"),
            DataType::Decimal { .. } => write!(f, "decimal"),
            DataType::Timestamp { .. } => write!(f, "timestamp"),
            DataType::TimestampWithLocalTimezone { .. } => write!(f, "timestamp"),
            DataType::Date { .. } => write!(f, "date"),
            DataType::Struct { children, .. } => {
                write!(f, "struct<")?;
                write_children(f, children)?;
                write!(f, ">")
            }
            DataType::List { child, .. } => write!(f, "array<{child}>"),
            DataType::Map { key, value, .. } => write!(f, "map<{key},{value}>"),
            DataType::Union { variants, .. } => {
                write!(f, "union<")?;
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{variant}")?;
                }
                write!(f, ">")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto::r#type::Kind;

    fn ty(kind: Kind, subtypes: Vec<u32>, field_names: Vec<&str>) -> proto::Type {
        proto::Type {
            kind: Some(kind as i32),
            subtypes,
            field_names: field_names.into_iter().map(String::from).collect(),
            maximum_length: None,
            precision: None,
            scale: None,
        }
    }

    #[test]
    fn renders_flat_struct() {
        let types = vec![
            ty(Kind::Struct, vec![1, 2], vec!["a", "b"]),
            ty(Kind::Int, vec![], vec![]),
            ty(Kind::String, vec![], vec![]),
        ];
        let root = RootDataType::from_proto(&types).unwrap();
        assert_eq!(root.to_string(), "struct<a:int,b:string>");
    }

    #[test]
    fn renders_nested_composites() {
        let types = vec![
            ty(Kind::Struct, vec![1, 2], vec!["ids", "meta"]),
            ty(Kind::List, vec![3], vec![]),
            ty(Kind::Map, vec![4, 5], vec![]),
            ty(Kind::Long, vec![], vec![]),
            ty(Kind::String, vec![], vec![]),
            ty(Kind::Double, vec![], vec![]),
        ];
        let root = RootDataType::from_proto(&types).unwrap();
        assert_eq!(
            root.to_string(),
            "struct<ids:array<bigint>,meta:map<string,double>>"
        );
    }

    #[test]
    fn short_renders_as_tinyint() {
        let types = vec![
            ty(Kind::Struct, vec![1], vec!["n"]),
            ty(Kind::Short, vec![], vec![]),
        ];
        let root = RootDataType::from_proto(&types).unwrap();
        assert_eq!(root.to_string(), "struct<n:tinyint>");
    }

    #[test]
    fn decimal_varchar_char_date_are_bare() {
        let mut decimal = ty(Kind::Decimal, vec![], vec![]);
        decimal.precision = Some(10);
        decimal.scale = Some(2);
        let types = vec![
            ty(Kind::Struct, vec![1, 2, 3, 4], vec!["d", "v", "c", "dt"]),
            decimal,
            ty(Kind::Varchar, vec![], vec![]),
            ty(Kind::Char, vec![], vec![]),
            ty(Kind::Date, vec![], vec![]),
        ];
        let root = RootDataType::from_proto(&types).unwrap();
        assert_eq!(root.to_string(), "struct<d:decimal,v:varchar,c:char,dt:date>");
    }

    #[test]
    fn union_renders_variants() {
        let types = vec![
            ty(Kind::Struct, vec![1], vec!["u"]),
            ty(Kind::Union, vec![2, 3], vec![]),
            ty(Kind::Int, vec![], vec![]),
            ty(Kind::String, vec![], vec![]),
        ];
        let root = RootDataType::from_proto(&types).unwrap();
        assert_eq!(root.to_string(), "struct<u:union<int,string>>");
    }
}
