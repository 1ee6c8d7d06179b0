use crate::config::SpatialConfig;
use crate::errors::{SpatialError, SpatialResult};
use crate::subject::{AsSubject, Subject};

use super::alias::AliasGenerator;
use super::identifier;
use super::operation::{Operation, SpatialFunction};
use super::parameter::Parameter;

/// One spatial calculation: an operation, the subjects it applies to in
/// argument order, trailing scalar parameters and an optional SRID every
/// geometry argument is transformed to first.
///
/// # Examples
///
/// ```rust,ignore
/// use postgis_adapter::sql::{Calculation, SpatialFunction};
///
/// let calc = Calculation::new(SpatialFunction::Distance)
///     .with_subject(&city)?
///     .with_subject(&street)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation<'a> {
    operation: Operation,
    subjects: Vec<Subject<'a>>,
    parameters: Vec<Parameter>,
    transform_to: Option<i32>,
}

impl<'a> Calculation<'a> {
    pub fn new(operation: impl Into<Operation>) -> Self {
        Calculation {
            operation: operation.into(),
            subjects: Vec::new(),
            parameters: Vec::new(),
            transform_to: None,
        }
    }

    pub fn subject(mut self, subject: Subject<'a>) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Appends the subject form of `value`.
    pub fn with_subject<S: AsSubject + ?Sized>(mut self, value: &'a S) -> SpatialResult<Self> {
        self.subjects.push(value.as_subject()?);
        Ok(self)
    }

    pub fn parameter(mut self, parameter: impl Into<Parameter>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    /// Wraps every geometry argument in a transform to `srid`.
    pub fn transform_to(mut self, srid: i32) -> Self {
        self.transform_to = Some(srid);
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn subjects(&self) -> &[Subject<'a>] {
        &self.subjects
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn transform_srid(&self) -> Option<i32> {
        self.transform_to
    }
}

/// Renders a [`Calculation`] as a single `SELECT`.
///
/// Persisted subjects each get a fresh alias (`w1`, `w2`, ...) and contribute
/// one `FROM` entry and one primary key condition, so the same record used
/// twice appears twice. Literal subjects are inlined as hex-EWKB casts and
/// add nothing to `FROM`. With no persisted subject there is no `FROM` or
/// `WHERE` at all.
///
/// ```text
/// SELECT ST_Distance(w1.geom, w2.geom) FROM cities w1, streets w2 WHERE w1.id = 5 AND w2.id = 7
/// SELECT (w1.geom << w2.geom) FROM cities w1, cities w2 WHERE w1.id = 1 AND w2.id = 2
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SqlBuilder<'a> {
    config: &'a SpatialConfig,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(config: &'a SpatialConfig) -> Self {
        SqlBuilder { config }
    }

    /// The SQL name of `function` under the configured naming and prefix.
    pub fn function_name(&self, function: SpatialFunction) -> String {
        function.sql_name(self.config.naming(), self.config.function_prefix())
    }

    /// # Errors
    ///
    /// Returns `InvalidOperation` when a bounding-box operator does not get
    /// exactly two subjects or is given parameters, and `InvalidParameter`
    /// when a parameter cannot be rendered.
    pub fn build(&self, calculation: &Calculation<'_>) -> SpatialResult<String> {
        let mut aliases = AliasGenerator::new();
        let mut tables = Vec::new();
        let mut conditions = Vec::new();
        let mut arguments = Vec::with_capacity(calculation.subjects.len());

        for subject in &calculation.subjects {
            let expression = match subject {
                Subject::Persisted(record) => {
                    let alias = aliases.next_alias();
                    tables.push(format!("{} {}", identifier(&record.table), alias));
                    conditions.push(format!(
                        "{}.{} = {}",
                        alias,
                        identifier(&record.primary_key),
                        record.id
                    ));
                    format!("{}.{}", alias, identifier(&record.column))
                }
                Subject::Literal(geometry) => geometry.sql_literal()?,
            };

            let expression = match calculation.transform_to {
                Some(srid) => format!(
                    "{}({}, {})",
                    self.function_name(SpatialFunction::Transform),
                    expression,
                    srid
                ),
                None => expression,
            };
            arguments.push(expression);
        }

        let projection = match calculation.operation {
            Operation::Function(function) => {
                for parameter in &calculation.parameters {
                    arguments.push(parameter.render()?);
                }
                format!("{}({})", self.function_name(function), arguments.join(", "))
            }
            Operation::BoundingBox(op) => {
                if arguments.len() != 2 || !calculation.parameters.is_empty() {
                    log::error!(
                        "Bounding box operator {} needs two subjects and no parameters",
                        op
                    );
                    return Err(SpatialError::InvalidOperation(format!(
                        "bounding box operator '{}' takes exactly two subjects and no parameters",
                        op
                    )));
                }
                format!("({} {} {})", arguments[0], op.token(), arguments[1])
            }
        };

        let mut sql = format!("SELECT {}", projection);
        if !tables.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&tables.join(", "));
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        Ok(sql)
    }
}
