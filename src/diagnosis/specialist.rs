use serde::Serialize;

const SEARCH_BASE_URL: &str = "https://www.google.com/search?q=";

/// 确诊肺炎时推荐的专科
pub const SPECIALISTS: [&str; 2] = ["Primary Care Doctor", "Lung Specialist"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialistLink {
    pub name: String,
    pub url: String,
}

impl SpecialistLink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url: doctor_search(name),
        }
    }
}

/// 附近专科医生搜索链接，查询词按表单编码（空格为 `+`）
pub fn doctor_search(doctor_type: &str) -> String {
    let query: String = url::form_urlencoded::byte_serialize(doctor_type.as_bytes()).collect();
    format!("{}{}+near+me", SEARCH_BASE_URL, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lung_specialist_link() {
        assert_eq!(
            doctor_search("Lung Specialist"),
            "https://www.google.com/search?q=Lung+Specialist+near+me"
        );
    }

    #[test]
    fn special_characters_are_encoded() {
        assert_eq!(
            doctor_search("Ear & Nose"),
            "https://www.google.com/search?q=Ear+%26+Nose+near+me"
        );
    }

    #[test]
    fn links_cover_both_specialists() {
        let links: Vec<_> = SPECIALISTS.iter().map(|name| SpecialistLink::new(name)).collect();
        assert_eq!(links[0].url, "https://www.google.com/search?q=Primary+Care+Doctor+near+me");
        assert_eq!(links[1].name, "Lung Specialist");
    }
}
