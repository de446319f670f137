//! @acp:module "Intent Rules"
//! @acp:summary "Ordered trigger table mapping substrings to intent fields"
//! @acp:domain intent
//! @acp:layer data
//!
//! Rules are evaluated top to bottom per field and the first match wins.
//! Overlaps are settled by position in [`RULES`], never by trigger length:
//! `southeast asian` must precede `east asian`, `javascript` must precede
//! `java`, and `黑色电影` must precede `电影`.
//!
//! Triggers are matched against the lowercased input, so they are written
//! in lowercase.

use serde::Serialize;

/// Intent slot a rule assigns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SoftwareTask,
    Language,
    Framework,
    Gender,
    Ethnicity,
    AgeRange,
    Character,
    Action,
    Energy,
    ArtStyle,
    DesignStyle,
    DesignRequirement,
    Lighting,
    Theme,
    Era,
    DirectorStyle,
    Clothing,
    Hairstyle,
    Product,
}

/// One row of the table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub field: Field,
    /// Any of these substrings fires the rule
    pub triggers: &'static [&'static str],
    /// When non-empty, one of these must also be present
    pub requires: &'static [&'static str],
    pub value: &'static str,
}

impl Rule {
    pub fn matches(&self, text_lower: &str) -> bool {
        self.triggers.iter().any(|t| text_lower.contains(t))
            && (self.requires.is_empty() || self.requires.iter().any(|r| text_lower.contains(r)))
    }
}

const fn rule(field: Field, triggers: &'static [&'static str], value: &'static str) -> Rule {
    Rule {
        field,
        triggers,
        requires: &[],
        value,
    }
}

const fn rule_with(
    field: Field,
    triggers: &'static [&'static str],
    requires: &'static [&'static str],
    value: &'static str,
) -> Rule {
    Rule {
        field,
        triggers,
        requires,
        value,
    }
}

const TEST_CUES: &[&str] = &["test", "测试", "bug", "qa"];
const DEPLOY_CUES: &[&str] = &["deploy", "部署", "docker", "pipeline", "ci/cd"];
const KAMEHAMEHA_CUES: &[&str] = &["龟派气功", "kamehameha", "能量波"];

/// @acp:summary "The complete ordered rule table"
pub const RULES: &[Rule] = &[
    // Software tasks
    rule(
        Field::SoftwareTask,
        &["performance test", "load test", "性能测试", "压测"],
        "performance_test",
    ),
    rule_with(Field::SoftwareTask, TEST_CUES, &["unit", "单元"], "unit_test"),
    rule(Field::SoftwareTask, TEST_CUES, "api_test"),
    rule_with(Field::SoftwareTask, DEPLOY_CUES, &["docker"], "docker_file"),
    rule(Field::SoftwareTask, DEPLOY_CUES, "ci_pipeline"),
    rule(
        Field::SoftwareTask,
        &["architect", "架构", "c4", "system design", "系统设计"],
        "architecture_design",
    ),
    rule(
        Field::SoftwareTask,
        &["database", "schema", "sql", "数据库", "表结构"],
        "db_schema_design",
    ),
    rule(
        Field::SoftwareTask,
        &["readme", "documentation", "docs", "文档"],
        "readme_generation",
    ),
    rule(
        Field::SoftwareTask,
        &["security", "audit", "vuln", "安全", "漏洞"],
        "security_audit",
    ),
    rule(
        Field::SoftwareTask,
        &["code", "代码", "script", "脚本", "implement", "实现", "函数"],
        "code_generation",
    ),
    // Languages
    rule(Field::Language, &["python"], "Python"),
    rule(Field::Language, &["javascript", "typescript", "node.js", "nodejs"], "JavaScript"),
    rule(Field::Language, &["java"], "Java"),
    rule(Field::Language, &["golang", "go语言", " go "], "Go"),
    rule(Field::Language, &["rust"], "Rust"),
    // Frameworks
    rule(Field::Framework, &["react"], "React"),
    rule(Field::Framework, &["vue"], "Vue"),
    rule(Field::Framework, &["pytest"], "pytest"),
    rule(Field::Framework, &["jest"], "Jest"),
    rule(Field::Framework, &["django"], "Django"),
    rule(Field::Framework, &["fastapi"], "FastAPI"),
    rule(Field::Framework, &["flask"], "Flask"),
    rule(Field::Framework, &["spring"], "Spring Boot"),
    // Subject
    rule(
        Field::Gender,
        &["女", "woman", "female", "girl", "lady"],
        "female",
    ),
    rule(Field::Gender, &["男", "man", "male", "boy", "悟空", "goku"], "male"),
    rule(
        Field::Ethnicity,
        &["东南亚", "southeast asian", "southeast_asian", "泰国", "越南"],
        "Southeast_Asian",
    ),
    rule(
        Field::Ethnicity,
        &["东亚", "east asian", "east_asian", "中国", "日本", "韩国", "chinese", "japanese", "korean"],
        "East_Asian",
    ),
    rule(
        Field::Ethnicity,
        &["南亚", "south asian", "south_asian", "印度", "indian"],
        "South_Asian",
    ),
    rule(
        Field::Ethnicity,
        &["中东", "middle eastern", "middle_eastern", "arab"],
        "Middle_Eastern",
    ),
    rule(
        Field::Ethnicity,
        &["拉丁", "latin", "latina", "latino"],
        "Latin_American",
    ),
    rule(Field::Ethnicity, &["非洲", "african"], "African"),
    rule(Field::Ethnicity, &["欧洲", "欧美", "european"], "European"),
    rule(Field::AgeRange, &["年轻", "young", "少女", "青年"], "young_adult"),
    rule(Field::AgeRange, &["儿童", "child", "孩子", "kid"], "child"),
    rule(Field::AgeRange, &["老人", "老年", "elderly"], "elderly"),
    rule(Field::AgeRange, &["中年", "middle-aged", "middle aged"], "adult"),
    rule(Field::Character, &["悟空", "goku"], "Son Goku"),
    // Action and energy
    rule(Field::Action, KAMEHAMEHA_CUES, "kamehameha"),
    rule(
        Field::Action,
        &["功夫", "武术", "kung fu", "martial arts"],
        "martial_arts",
    ),
    rule(
        Field::Action,
        &["打斗", "格斗", "比武", "对决", "fight", "duel"],
        "combat",
    ),
    rule(Field::Action, &["飞行", "flying"], "flying"),
    rule(Field::Energy, KAMEHAMEHA_CUES, "blue_energy_blast"),
    rule(Field::Energy, &["能量", "气息", "energy", "aura"], "energy_aura"),
    // Art style
    rule(Field::ArtStyle, &["3d", "蜡像", "wax"], "wax_figure_3d"),
    rule(Field::ArtStyle, &["全息", "holographic"], "holographic"),
    rule(Field::ArtStyle, &["雕塑", "sculpture"], "sculpture"),
    rule(Field::ArtStyle, &["动漫", "anime", "二次元"], "anime"),
    rule(Field::ArtStyle, &["漫画", "manga"], "manga"),
    rule(Field::ArtStyle, &["插画", "illustration"], "illustration"),
    rule(
        Field::ArtStyle,
        &["写实", "realistic", "photorealistic"],
        "realistic",
    ),
    // Design
    rule(
        Field::DesignStyle,
        &["温馨可爱", "可爱", "温馨", "cute"],
        "温馨可爱",
    ),
    rule(
        Field::DesignStyle,
        &["现代简约", "简约", "minimalist", "minimal"],
        "现代简约",
    ),
    rule(Field::DesignRequirement, &["海报", "poster"], "poster"),
    rule(Field::DesignRequirement, &["卡片", "贺卡", "card"], "card"),
    rule(Field::DesignRequirement, &["横幅", "banner"], "banner"),
    rule(Field::DesignRequirement, &["排版", "layout"], "layout"),
    // Lighting
    rule(
        Field::Lighting,
        &["黑色电影", "film noir", "noir"],
        "film_noir",
    ),
    rule(
        Field::Lighting,
        &["电影级", "电影", "cinematic"],
        "cinematic",
    ),
    rule(Field::Lighting, &["霓虹", "neon"], "neon"),
    rule(Field::Lighting, &["戏剧", "dramatic"], "dramatic"),
    rule(Field::Lighting, &["柔光", "soft light"], "soft"),
    rule(
        Field::Lighting,
        &["自然光", "natural light", "自然"],
        "natural",
    ),
    // Scene
    rule(Field::Theme, &["赛博朋克", "cyberpunk"], "cyberpunk"),
    rule(Field::Theme, &["奇幻", "魔幻", "fantasy"], "fantasy"),
    rule(Field::Theme, &["复古", "vintage", "retro"], "vintage"),
    rule(Field::Era, &["民国"], "republic_of_china"),
    rule(
        Field::Era,
        &["古代", "古装", "ancient", "战国", "秦朝", "汉朝", "唐朝"],
        "ancient",
    ),
    rule(
        Field::DirectorStyle,
        &["张艺谋", "zhang yimou"],
        "zhang_yimou",
    ),
    rule(
        Field::DirectorStyle,
        &["王家卫", "wong kar"],
        "wong_kar_wai",
    ),
    rule(Field::DirectorStyle, &["徐克", "tsui hark"], "tsui_hark"),
    rule(
        Field::Clothing,
        &["汉服", "hanfu", "旗袍", "qipao", "古装"],
        "traditional_chinese",
    ),
    rule(Field::Clothing, &["和服", "kimono"], "kimono"),
    rule(
        Field::Clothing,
        &["西装", "职业装", "business suit"],
        "business",
    ),
    rule(
        Field::Clothing,
        &["晚礼服", "礼服", "evening gown"],
        "formal",
    ),
    rule(Field::Clothing, &["休闲", "casual"], "casual"),
    rule(
        Field::Hairstyle,
        &["发髻", "古风发型", "盘发"],
        "ancient_chinese",
    ),
    rule(
        Field::Hairstyle,
        &["日式发型", "日本发髻"],
        "traditional_japanese",
    ),
    rule(
        Field::Product,
        &["产品", "商品", "product shot", "product photo"],
        "product",
    ),
];

/// All rules for one field, in precedence order
pub fn rules_for(field: Field) -> impl Iterator<Item = &'static Rule> {
    RULES.iter().filter(move |r| r.field == field)
}

/// First rule for `field` that fires on `text_lower`
pub fn first_match(field: Field, text_lower: &str) -> Option<&'static Rule> {
    rules_for(field).find(|r| r.matches(text_lower))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(field: Field, text: &str) -> Option<&'static str> {
        first_match(field, &text.to_lowercase()).map(|r| r.value)
    }

    #[test]
    fn test_triggers_are_lowercase() {
        for rule in RULES {
            for trigger in rule.triggers.iter().chain(rule.requires) {
                assert_eq!(*trigger, trigger.to_lowercase(), "rule {:?}", rule.field);
            }
        }
    }

    #[test]
    fn test_requires_gates_rule() {
        assert_eq!(value(Field::SoftwareTask, "write unit tests"), Some("unit_test"));
        assert_eq!(value(Field::SoftwareTask, "test the login api"), Some("api_test"));
        assert_eq!(value(Field::SoftwareTask, "docker 部署"), Some("docker_file"));
        assert_eq!(value(Field::SoftwareTask, "部署到生产"), Some("ci_pipeline"));
    }

    #[test]
    fn test_order_settles_overlaps() {
        assert_eq!(value(Field::Ethnicity, "southeast asian model"), Some("Southeast_Asian"));
        assert_eq!(value(Field::Ethnicity, "东南亚女孩"), Some("Southeast_Asian"));
        assert_eq!(value(Field::Language, "a javascript helper"), Some("JavaScript"));
        assert_eq!(value(Field::Gender, "a woman"), Some("female"));
        assert_eq!(value(Field::Lighting, "黑色电影风格"), Some("film_noir"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(value(Field::Theme, "a quiet garden"), None);
        assert_eq!(value(Field::SoftwareTask, "年轻女性肖像"), None);
    }
}
