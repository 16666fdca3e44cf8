//! Whatlang Detector - 语言检测实现
//!
//! 基于 whatlang 的统计检测，对相同输入结果确定。
//! 检测信号不足（不满最小可见字符数）时返回 unknown 而非猜测

use whatlang::Lang;

use crate::application::ports::{Detection, LanguageDetectorPort};
use crate::domain::speech::Language;

/// 采信检测所需的最小可见字符数
const MIN_VISIBLE_CHARS: usize = 3;

/// 乌尔都语特有字母（阿拉伯字母表之外的扩展）
const URDU_MARKERS: &str = "ٹڈڑںہھےپچژگک";

/// Whatlang 语言检测器
pub struct WhatlangDetector;

impl WhatlangDetector {
    pub fn new() -> Self {
        Self
    }

    /// whatlang 的 ISO 639-3 到常用两字母标签
    fn to_tag(lang: Lang) -> &'static str {
        match lang {
            Lang::Eng => "en",
            Lang::Urd => "ur",
            Lang::Hin => "hi",
            Lang::Ara => "ar",
            Lang::Pes => "fa",
            Lang::Fra => "fr",
            Lang::Deu => "de",
            Lang::Spa => "es",
            Lang::Por => "pt",
            Lang::Ita => "it",
            Lang::Nld => "nl",
            Lang::Rus => "ru",
            Lang::Ukr => "uk",
            Lang::Pol => "pl",
            Lang::Tur => "tr",
            Lang::Jpn => "ja",
            Lang::Kor => "ko",
            Lang::Cmn => "zh",
            _ => lang.code(),
        }
    }

    /// 阿拉伯字母系检测结果带乌尔都语特有字母时纠正为乌尔都语
    /// （hi/ar/fa 与 ur 在短文本上常被混判）
    fn correct_urdu<'a>(tag: &'a str, text: &str) -> &'a str {
        if matches!(tag, "hi" | "ar" | "fa")
            && text.chars().any(|c| URDU_MARKERS.contains(c))
        {
            "ur"
        } else {
            tag
        }
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetectorPort for WhatlangDetector {
    fn detect(&self, text: &str) -> Detection {
        let visible = text.chars().filter(|c| !c.is_whitespace()).count();
        if visible < MIN_VISIBLE_CHARS {
            return Detection::unknown();
        }

        let Some(info) = whatlang::detect(text) else {
            return Detection::unknown();
        };

        let tag = Self::correct_urdu(Self::to_tag(info.lang()), text);

        match Language::new(tag) {
            Ok(language) => Detection::new(language, info.confidence()),
            Err(_) => Detection::unknown(),
        }
    }
}
