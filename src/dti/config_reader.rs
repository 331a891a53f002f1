use crate::dti::*;
use dt_index::{IndexConfig, LabelColumn};

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::fs;

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "datasetName")]
    pub dataset_name: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputProvider {
    Xlsx,
    Csv,
}

impl FileSource {
    pub fn provider(&self) -> DtiResult<InputProvider> {
        match self.provider.to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(InputProvider::Xlsx),
            "csv" => Ok(InputProvider::Csv),
            _ => UnknownProviderSnafu {
                provider: self.provider.clone(),
            }
            .fail(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LabelSetting {
    pub name: String,
    pub default: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSettings {
    #[serde(rename = "idColumn")]
    pub id_column: Option<String>,
    #[serde(rename = "nameColumn")]
    pub name_column: Option<String>,
    #[serde(rename = "periodColumn")]
    pub period_column: Option<String>,
    #[serde(rename = "labelColumns")]
    pub label_columns: Option<Vec<LabelSetting>>,
    #[serde(rename = "unknownId")]
    pub unknown_id: Option<String>,
    #[serde(rename = "idWidth")]
    pub id_width: Option<usize>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DtiRules {
    #[serde(rename = "varianceThreshold")]
    pub variance_threshold: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DtiConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "fileSources", default)]
    pub file_sources: Vec<FileSource>,
    pub columns: Option<ColumnSettings>,
    pub indicators: Option<Vec<String>>,
    pub rules: Option<DtiRules>,
}

impl DtiConfig {
    /// The options of the index computation. Everything that is not set in
    /// the configuration keeps its default value.
    pub fn index_config(&self) -> DtiResult<IndexConfig> {
        let mut res = IndexConfig::default();
        if let Some(cols) = &self.columns {
            if let Some(x) = &cols.id_column {
                res.id_column = x.clone();
            }
            if let Some(x) = &cols.name_column {
                res.name_column = x.clone();
            }
            if let Some(x) = &cols.period_column {
                res.period_column = x.clone();
            }
            if let Some(labels) = &cols.label_columns {
                res.label_columns = labels
                    .iter()
                    .map(|l| LabelColumn::new(&l.name, &l.default))
                    .collect();
            }
            if let Some(x) = &cols.unknown_id {
                res.unknown_id = x.clone();
            }
            if let Some(x) = cols.id_width {
                res.id_width = x;
            }
        }
        if let Some(indicators) = &self.indicators {
            if indicators.is_empty() {
                whatever!("The list of indicators is empty");
            }
            res.core_indicators = indicators.clone();
        }
        if let Some(t) = self.rules.as_ref().and_then(|r| r.variance_threshold) {
            res.variance_threshold = t;
        }
        Ok(res)
    }
}

pub fn read_config(path: &str) -> DtiResult<DtiConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: DtiConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> DtiResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_index::DEFAULT_NAME_COLUMN;

    #[test]
    fn parse_full_config() {
        let js = r#"{
          "outputSettings": {"datasetName": "2013年结果", "outputDirectory": "out"},
          "fileSources": [
            {"provider": "xlsx", "filePath": "2013.xlsx", "excelWorksheetName": "Sheet1"},
            {"provider": "csv", "filePath": "2014.csv"}
          ],
          "columns": {
            "idColumn": "code",
            "labelColumns": [{"name": "行业名称", "default": "未知行业"}],
            "idWidth": 8
          },
          "indicators": ["A", "B"],
          "rules": {"varianceThreshold": 0.9}
        }"#;
        let config: DtiConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.file_sources.len(), 2);
        assert_eq!(config.file_sources[0].provider().unwrap(), InputProvider::Xlsx);
        assert_eq!(
            config.file_sources[0].excel_worksheet_name.as_deref(),
            Some("Sheet1")
        );
        assert_eq!(config.file_sources[1].provider().unwrap(), InputProvider::Csv);

        let ic = config.index_config().unwrap();
        assert_eq!(ic.id_column, "code");
        assert_eq!(ic.name_column, DEFAULT_NAME_COLUMN);
        assert_eq!(ic.label_columns, vec![LabelColumn::new("行业名称", "未知行业")]);
        assert_eq!(ic.id_width, 8);
        assert_eq!(ic.core_indicators, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(ic.variance_threshold, 0.9);
    }

    #[test]
    fn empty_config_keeps_defaults() {
        let config: DtiConfig = serde_json::from_str("{}").unwrap();
        assert!(config.file_sources.is_empty());
        assert_eq!(config.index_config().unwrap(), IndexConfig::default());
    }

    #[test]
    fn unknown_provider() {
        let source = FileSource {
            provider: "parquet".to_string(),
            file_path: "x.parquet".to_string(),
            excel_worksheet_name: None,
        };
        assert!(matches!(
            source.provider(),
            Err(DtiError::UnknownProvider { provider }) if provider == "parquet"
        ));
    }

    #[test]
    fn empty_indicator_list_is_rejected() {
        let config = DtiConfig {
            indicators: Some(vec![]),
            ..Default::default()
        };
        assert!(config.index_config().is_err());
    }
}
