use crate::diagnosis::specialist::{SpecialistLink, SPECIALISTS};
use crate::utils::error::DetectError;
use crate::Result;
use serde::Serialize;

/// 模型输出：类别下标、置信度与完整概率分布
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub class_index: usize,
    pub confidence: f32,
    pub probabilities: Vec<f32>,
}

/// 诊断类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    Normal,
    BacterialPneumonia,
    ViralPneumonia,
}

impl Diagnosis {
    pub fn from_index(index: usize) -> Result<Self> {
        match index {
            0 => Ok(Diagnosis::Normal),
            1 => Ok(Diagnosis::BacterialPneumonia),
            2 => Ok(Diagnosis::ViralPneumonia),
            other => Err(DetectError::Inference(format!("Unknown class index: {}", other))),
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Diagnosis::Normal => "The patient is not suffering from Pneumonia 😄🎉🎉",
            Diagnosis::BacterialPneumonia => "The patient is suffering from Bacterial Pneumonia 😔",
            Diagnosis::ViralPneumonia => "The patient is suffering from Viral Pneumonia 😔",
        }
    }

    pub fn is_pneumonia(&self) -> bool {
        !matches!(self, Diagnosis::Normal)
    }
}

/// 页面与 API 共用的展示内容
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisReport {
    pub diagnosis: Diagnosis,
    pub headline: String,
    pub confidence_text: String,
    /// 仅无肺炎时放气球
    pub celebrate: bool,
    /// 无肺炎时为空，否则固定两条
    pub specialists: Vec<SpecialistLink>,
}

impl DiagnosisReport {
    pub fn from_prediction(prediction: &Prediction) -> Result<Self> {
        let diagnosis = Diagnosis::from_index(prediction.class_index)?;

        let specialists = if diagnosis.is_pneumonia() {
            SPECIALISTS.iter().map(|name| SpecialistLink::new(name)).collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            diagnosis,
            headline: diagnosis.headline().to_string(),
            confidence_text: format!("Confidence of model: {:.2}%", prediction.confidence * 100.0),
            celebrate: !diagnosis.is_pneumonia(),
            specialists,
        })
    }
}

/// 一次预测的完整结果
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisResult {
    /// 处理耗时（秒）
    pub processing_time: f32,
    pub prediction: Prediction,
    pub report: DiagnosisReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(class_index: usize, confidence: f32) -> Prediction {
        Prediction { class_index, confidence, probabilities: vec![confidence; 3] }
    }

    #[test]
    fn normal_has_no_specialists() {
        let report = DiagnosisReport::from_prediction(&prediction(0, 0.9731)).unwrap();
        assert_eq!(report.diagnosis, Diagnosis::Normal);
        assert!(report.specialists.is_empty());
        assert!(report.celebrate);
        assert_eq!(report.confidence_text, "Confidence of model: 97.31%");
    }

    #[test]
    fn pneumonia_has_exactly_two_specialists() {
        for class_index in [1, 2] {
            let report = DiagnosisReport::from_prediction(&prediction(class_index, 0.5)).unwrap();
            assert_eq!(report.specialists.len(), 2);
            assert!(!report.celebrate);
        }
    }

    #[test]
    fn headlines_follow_class_index() {
        let bacterial = DiagnosisReport::from_prediction(&prediction(1, 0.8)).unwrap();
        assert!(bacterial.headline.contains("Bacterial Pneumonia"));

        let viral = DiagnosisReport::from_prediction(&prediction(2, 0.8)).unwrap();
        assert!(viral.headline.contains("Viral Pneumonia"));
    }

    #[test]
    fn unknown_class_is_rejected() {
        assert!(Diagnosis::from_index(3).is_err());
    }
}
