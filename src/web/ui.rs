use crate::{
    diagnosis::{DiagnosisPipeline, DiagnosisReport},
    image::ImageLoader,
    web::handlers::read_image_field,
    Config, Result,
};
use axum::{
    extract::{Multipart, State},
    response::Html,
    Form,
};
use serde::Deserialize;
use std::fmt::Write;

const PAGE_TEMPLATE: &str = include_str!("../../templates/index.html");

/// 页面状态：idle -> uploaded -> predicted，全部由用户操作驱动
#[derive(Debug, Clone)]
pub enum PageState {
    Idle,
    Uploaded { preview: String },
    Predicted { preview: String, report: DiagnosisReport },
}

/// 预测表单，图像以数据URL回传，服务端不保存状态
#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub image: String,
}

/// 首页处理器
pub async fn index_handler() -> Html<String> {
    Html(render_page(&PageState::Idle))
}

/// 文件上传：显示预览和 Predict 按钮
pub async fn upload_handler(
    State(config): State<Config>,
    mut multipart: Multipart,
) -> Result<Html<String>> {
    let bytes = read_image_field(&mut multipart).await?;

    // 不是图像时在此处直接失败
    let bytes = DiagnosisPipeline::validate_bytes(bytes, &config).await?;
    tracing::debug!("Upload accepted: {} bytes", bytes.len());

    let preview = ImageLoader::to_data_url(&bytes);
    Ok(Html(render_page(&PageState::Uploaded { preview })))
}

/// 点击 Predict：运行模型并渲染结果
pub async fn predict_handler(
    State(config): State<Config>,
    Form(form): Form<PredictForm>,
) -> Result<Html<String>> {
    let bytes = ImageLoader::decode_base64(&form.image)?;
    let preview = ImageLoader::to_data_url(&bytes);

    let result = DiagnosisPipeline::process_bytes(bytes, &config).await?;

    Ok(Html(render_page(&PageState::Predicted {
        preview,
        report: result.report,
    })))
}

/// 渲染整页 HTML
pub fn render_page(state: &PageState) -> String {
    let mut body = String::new();

    match state {
        PageState::Idle => {}
        PageState::Uploaded { preview } => {
            render_preview(&mut body, preview);
            render_predict_form(&mut body, preview);
        }
        PageState::Predicted { preview, report } => {
            render_preview(&mut body, preview);
            render_predict_form(&mut body, preview);
            render_report(&mut body, report);
        }
    }

    PAGE_TEMPLATE.replace("{{BODY}}", &body)
}

fn render_preview(out: &mut String, preview: &str) {
    let _ = writeln!(
        out,
        r#"        <div class="preview"><img src="{}" alt="Uploaded X-ray"></div>"#,
        escape_html(preview)
    );
}

fn render_predict_form(out: &mut String, preview: &str) {
    let _ = writeln!(
        out,
        r#"        <form action="/predict" method="post">
            <input type="hidden" name="image" value="{}">
            <button type="submit" id="predict-button" class="btn">Predict</button>
        </form>"#,
        escape_html(preview)
    );
}

/// 三种固定文案之一；仅肺炎时附两条专科搜索链接
pub fn render_report(out: &mut String, report: &DiagnosisReport) {
    let _ = writeln!(out, r#"        <div class="result">"#);
    let _ = writeln!(out, "            <h3>{}</h3>", escape_html(&report.headline));
    let _ = writeln!(out, "            <h3>{}</h3>", escape_html(&report.confidence_text));
    let _ = writeln!(out, "        </div>");

    if report.celebrate {
        let _ = writeln!(out, r#"        <div class="balloons">"#);
        for i in 0..12 {
            let _ = writeln!(
                out,
                r#"            <span style="left: {}%; animation-delay: {:.1}s">🎈</span>"#,
                (i * 17 + 5) % 95,
                (i % 4) as f32 * 0.3
            );
        }
        let _ = writeln!(out, "        </div>");
    }

    if !report.specialists.is_empty() {
        let _ = writeln!(out, "        <hr>");
        let _ = writeln!(out, r#"        <div class="specialists">"#);
        let _ = writeln!(out, "            <h3>Specialists 👨‍⚕</h3>");
        let _ = writeln!(
            out,
            "            <p>Click on the specialist's name to find out the nearest specialist to you ...</p>"
        );
        let _ = writeln!(out, "            <ul>");
        for link in &report.specialists {
            let _ = writeln!(
                out,
                r#"                <li><a class="specialist-link" href="{}" target="_blank" rel="noopener">{}</a></li>"#,
                escape_html(&link.url),
                escape_html(&link.name)
            );
        }
        let _ = writeln!(out, "            </ul>");
        let _ = writeln!(out, "        </div>");
        let _ = writeln!(out, "        <hr>");
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::Prediction;

    fn report(class_index: usize) -> DiagnosisReport {
        let prediction = Prediction {
            class_index,
            confidence: 0.875,
            probabilities: vec![0.0625, 0.875, 0.0625],
        };
        DiagnosisReport::from_prediction(&prediction).unwrap()
    }

    fn predicted_page(class_index: usize) -> String {
        render_page(&PageState::Predicted {
            preview: "data:image/png;base64,AAAA".to_string(),
            report: report(class_index),
        })
    }

    #[test]
    fn idle_page_has_only_the_upload_form() {
        let page = render_page(&PageState::Idle);
        assert!(page.contains("Upload an image to predict"));
        assert!(!page.contains("predict-button"));
        assert!(!page.contains("{{BODY}}"));
    }

    #[test]
    fn uploaded_page_shows_preview_and_button() {
        let page = render_page(&PageState::Uploaded {
            preview: "data:image/png;base64,AAAA".to_string(),
        });
        assert!(page.contains(r#"<img src="data:image/png;base64,AAAA""#));
        assert!(page.contains("predict-button"));
        assert!(!page.contains("Confidence of model"));
    }

    #[test]
    fn normal_result_renders_no_specialist_links() {
        let page = predicted_page(0);
        assert!(page.contains("The patient is not suffering from Pneumonia"));
        assert!(page.contains("Confidence of model: 87.50%"));
        assert!(page.contains("🎈"));
        assert_eq!(page.matches("specialist-link").count(), 0);
    }

    #[test]
    fn pneumonia_result_renders_two_specialist_links() {
        for class_index in [1, 2] {
            let page = predicted_page(class_index);
            assert_eq!(page.matches(r#"class="specialist-link""#).count(), 2);
            assert!(page.contains(r#"href="https://www.google.com/search?q=Lung+Specialist+near+me""#));
            assert!(!page.contains("🎈"));
        }
    }

    #[test]
    fn escapes_attribute_values() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
