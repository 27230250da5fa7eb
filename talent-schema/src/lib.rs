//! JSON rule/constraint tree construction and talent schema assembly.

#![deny(missing_docs)]

pub mod constraint;
pub mod rule;
pub mod talent_schema;
pub mod value_schema;

pub use constraint::{schema, Constraint, ConstraintOptions, NelsonSelector};
pub use rule::{Combinator, Rule, Rules};
pub use talent_schema::{assemble_rule, callee_rule, Metadata, OutputFeature, SchemaError, SkipCycleCheck, TalentSchema};
pub use value_schema::{ArraySchema, ObjectSchema, StringSchema, ValueSchema};
