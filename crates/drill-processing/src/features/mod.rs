//! Feature engineering stage.
//!
//! Derives ratio features from the drilling measurements. Every derived
//! column is `Float64`; a zero denominator or a null/non-finite operand
//! gives null rather than `inf`/`NaN`.

use crate::config::FeatureSettings;
use crate::schema::{
    DEPTH, DRILLING_STRENGTH, FLOW_EFFICIENCY, FLOW_RATE, PRESSURE, PRESSURE_GRADIENT, PT_RATIO,
    ROP, RPM, SPECIFIC_ENERGY, TEMPERATURE, TEMPERATURE_GRADIENT, TORQUE, WOB,
};
use crate::stages::FeatureEngineer;
use crate::utils::to_f64_values;
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::debug;

/// Default [`FeatureEngineer`] for drilling datasets.
#[derive(Debug, Default, Clone, Copy)]
pub struct DrillingFeatureEngineer;

impl DrillingFeatureEngineer {
    /// Add `pt_ratio` and `flow_efficiency`.
    pub fn add_ratio_features(&self, df: &mut DataFrame) -> Result<()> {
        let pressure = values(df, PRESSURE)?;
        let temperature = values(df, TEMPERATURE)?;
        let flow_rate = values(df, FLOW_RATE)?;

        add_column(df, PT_RATIO, divide(&pressure, &temperature))?;
        add_column(df, FLOW_EFFICIENCY, divide(&flow_rate, &pressure))?;
        Ok(())
    }

    /// Add depth gradients plus the mechanical features whose inputs exist.
    pub fn add_formation_features(&self, df: &mut DataFrame) -> Result<()> {
        let depth = values(df, DEPTH)?;
        let pressure = values(df, PRESSURE)?;
        let temperature = values(df, TEMPERATURE)?;

        add_column(df, PRESSURE_GRADIENT, divide(&pressure, &depth))?;
        add_column(df, TEMPERATURE_GRADIENT, divide(&temperature, &depth))?;

        if has_columns(df, &[WOB, RPM, ROP]) {
            let load = multiply(&values(df, WOB)?, &values(df, RPM)?);
            add_column(df, DRILLING_STRENGTH, divide(&load, &values(df, ROP)?))?;
        } else {
            debug!("Skipping {}: wob, rpm or rop not present", DRILLING_STRENGTH);
        }

        if has_columns(df, &[TORQUE, RPM, ROP]) {
            let work = multiply(&values(df, TORQUE)?, &values(df, RPM)?);
            add_column(df, SPECIFIC_ENERGY, divide(&work, &values(df, ROP)?))?;
        } else {
            debug!("Skipping {}: torque, rpm or rop not present", SPECIFIC_ENERGY);
        }

        Ok(())
    }
}

impl FeatureEngineer for DrillingFeatureEngineer {
    fn engineer(&self, mut df: DataFrame, settings: &FeatureSettings) -> Result<DataFrame> {
        let before = df.width();
        self.add_ratio_features(&mut df)?;
        if settings.add_formation_features {
            self.add_formation_features(&mut df)?;
        }
        debug!("Added {} derived columns", df.width() - before);
        Ok(df)
    }
}

fn values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .with_context(|| format!("feature source column '{}'", name))?;
    Ok(to_f64_values(column.as_materialized_series())?)
}

fn has_columns(df: &DataFrame, names: &[&str]) -> bool {
    let present = df.get_column_names();
    names.iter().all(|name| present.iter().any(|c| c.as_str() == *name))
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn divide(numerator: &[Option<f64>], denominator: &[Option<f64>]) -> Vec<Option<f64>> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| match (finite(*n), finite(*d)) {
            (Some(n), Some(d)) if d != 0.0 => finite(Some(n / d)),
            _ => None,
        })
        .collect()
}

fn multiply(left: &[Option<f64>], right: &[Option<f64>]) -> Vec<Option<f64>> {
    left.iter()
        .zip(right)
        .map(|(a, b)| Some(finite(*a)? * finite(*b)?))
        .collect()
}

fn add_column(df: &mut DataFrame, name: &str, values: Vec<Option<f64>>) -> Result<()> {
    df.with_column(Series::new(name.into(), values))
        .with_context(|| format!("adding feature '{}'", name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df![
            "depth" => [1000.0, 2000.0, 0.0],
            "pressure" => [2000.0, 0.0, 3000.0],
            "temperature" => [100.0, 80.0, 120.0],
            "flow_rate" => [500.0, 450.0, 600.0],
            "wob" => [20.0, 22.0, 25.0],
            "rpm" => [120.0, 130.0, 110.0],
            "rop" => [30.0, 0.0, 25.0],
            "torque" => [10.0, 11.0, 12.0],
        ]
        .unwrap()
    }

    fn column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_ratio_features() {
        let settings = FeatureSettings {
            add_formation_features: false,
        };
        let out = DrillingFeatureEngineer.engineer(sample(), &settings).unwrap();

        assert_eq!(out.width(), 10);
        assert_eq!(column(&out, PT_RATIO), vec![Some(20.0), Some(0.0), Some(25.0)]);
        // Zero pressure gives a null efficiency.
        assert_eq!(column(&out, FLOW_EFFICIENCY)[1], None);
    }

    #[test]
    fn test_formation_features() {
        let out = DrillingFeatureEngineer
            .engineer(sample(), &FeatureSettings::default())
            .unwrap();

        assert_eq!(out.height(), 3);
        assert_eq!(out.width(), 14);
        assert_eq!(column(&out, PRESSURE_GRADIENT)[0], Some(2.0));
        assert_eq!(column(&out, PRESSURE_GRADIENT)[2], None);
        assert_eq!(column(&out, DRILLING_STRENGTH)[0], Some(80.0));
        assert_eq!(column(&out, DRILLING_STRENGTH)[1], None);
        assert_eq!(column(&out, SPECIFIC_ENERGY)[0], Some(40.0));
    }

    #[test]
    fn test_mechanical_features_need_inputs() {
        let df = df![
            "depth" => [100.0],
            "pressure" => [10.0],
            "temperature" => [5.0],
            "flow_rate" => [1.0],
        ]
        .unwrap();
        let out = DrillingFeatureEngineer
            .engineer(df, &FeatureSettings::default())
            .unwrap();
        assert!(out.column(DRILLING_STRENGTH).is_err());
        assert!(out.column(SPECIFIC_ENERGY).is_err());
        assert!(out.column(TEMPERATURE_GRADIENT).is_ok());
    }

    #[test]
    fn test_missing_source_column_fails() {
        let df = df!["depth" => [1.0], "pressure" => [2.0]].unwrap();
        let err = DrillingFeatureEngineer
            .engineer(df, &FeatureSettings::default())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("temperature"));
    }

    #[test]
    fn test_null_operands_give_null() {
        assert_eq!(
            divide(&[Some(1.0), None, Some(f64::NAN)], &[Some(2.0), Some(1.0), Some(1.0)]),
            vec![Some(0.5), None, None]
        );
    }
}
