use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const UNTITLED: &str = "未命名";
pub const DEFAULT_LINK_TEXT: &str = "立即访问";

/// The `class` field as it arrives on the wire: a list of tags, a single
/// string with comma / whitespace separators, or anything else (no tags).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTags {
    List(Vec<Value>),
    Text(String),
    Other(Value),
}

/// Strings pass through, numbers and booleans are stringified, everything
/// else counts as absent.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_value(&Value::deserialize(deserializer)?))
}

pub(crate) fn scalar_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// One entry of the remote feed, before tag normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResource {
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub icon_style: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub link_text: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "scalar_text")]
    pub kind: Option<String>,
    #[serde(default, rename = "class")]
    pub tags: Option<RawTags>,
}

impl RawResource {
    /// `link`, or `url` when `link` is missing or blank.
    pub fn target(&self) -> Option<&str> {
        self.link
            .as_deref()
            .filter(|link| !link.trim().is_empty())
            .or(self.url.as_deref())
    }
}

/// Decodes feed entries one at a time; an entry that is not an object is
/// logged and skipped instead of failing the whole list.
pub fn decode_entries(values: Vec<Value>) -> Vec<RawResource> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                leptos::logging::warn!("[resources] skipping entry #{position}: {e}");
                None
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActionKind {
    #[default]
    Jump,
    Copy,
    Download,
}

impl ActionKind {
    /// Unknown or missing values fall back to `Jump`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("copy") => Self::Copy,
            Some("download") => Self::Download,
            _ => Self::Jump,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jump => "jump",
            Self::Copy => "copy",
            Self::Download => "download",
        }
    }
}

/// Canonical resource record. Only the tag classifier builds these, so nothing
/// downstream has to care about the string-or-list shape of `class`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    pub title: String,
    pub icon: Option<String>,
    pub icon_style: Option<String>,
    pub description: String,
    pub link: String,
    pub link_text: Option<String>,
    pub action: ActionKind,
    pub tags: Vec<String>,
}

impl Resource {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    pub fn display_link_text(&self) -> &str {
        match self.link_text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => DEFAULT_LINK_TEXT,
        }
    }
}

const BUNDLED_JSON: &str = r#"[
  {
    "title": "LRCLite",
    "icon": "fas fa-file",
    "description": "LRCLite，一个简单的歌词引擎",
    "link": "https://hub.gitmirmirror.com/raw.githubusercontent.com/mifongjvav/AFS/refs/heads/main/LRCLite.txt",
    "linkText": "获取函数",
    "type": "download",
    "class": "工具"
  },
  {
    "title": "星梦KN函数库",
    "icon": "fas fa-file",
    "description": " <p>原作者：旁观者JErS</p><p>包含列表排序、数据统计、几何计算、RSA加/解密、文本工具、颜色转换等76个实用函数。</p><p>部分函数来自其他函数库，在此对原作者进行感谢。</p>",
    "link": "https://kn.codemao.cn/view/?workId=233953447",
    "linkText": "获取函数",
    "type": "jump",
    "class": ["算法", "通用"]
  },
  {
    "title": "插值函数",
    "icon": "fas fa-file",
    "description": " <p>原作者：方圆圆</p><p>整合了6种插值函数，包括线性/n次/三角/弹跳（传参格式请编辑函数查看</p>",
    "link": "https://hub.gitmirror.com/raw.githubusercontent.com/mifongjvav/AFS/refs/heads/main/scc-part1.txt",
    "linkText": "获取函数",
    "type": "copy",
    "class": "数学"
  },
  {
    "title": "血显特效",
    "icon": "fas fa-file",
    "description": " <p>原作者：方圆圆</p><p>在指定位置绘制一个血条</p>",
    "link": "https://hub.gitmirror.com/raw.githubusercontent.com/mifongjvav/AFS/refs/heads/main/scc-part2.txt",
    "linkText": "获取函数",
    "type": "copy",
    "class": "特效"
  },
  {
    "title": "高精度三角函数",
    "icon": "fas fa-file",
    "description": " <p>原作者：方圆圆</p><p>提供18位精度的三角函数。注意，纯画笔和3d作品慎用！</p>",
    "link": "https://hub.gitmirror.com/raw.githubusercontent.com/mifongjvav/AFS/refs/heads/main/scc-part3.txt",
    "linkText": "获取函数",
    "type": "jump",
    "class": "数学"
  }
]"#;

const FEATURED_JSON: &str = r#"[
  {
    "title": "星梦KN函数库",
    "icon": "fas fa-file-zipper",
    "description": " <p>原作者：旁观者JErS</p><p>包含列表排序、数据统计、几何计算、RSA加/解密、文本工具、颜色转换等76个实用函数。</p><p>部分函数来自其他函数库，在此对原作者进行感谢。</p>",
    "link": "https://kn.codemao.cn/view/?workId=233953447",
    "linkText": "获取函数",
    "type": "jump",
    "class": ["函数库", "通用", "算法", "上架"]
  },
  {
    "title": "方圆圆函数库合集",
    "icon": "fas fa-cube",
    "description": " <p>原作者：方圆圆</p><p>就是合集而已，函数以后这里更新哦</p>",
    "link": "https://kn.codemao.cn/view/?workId=289701127",
    "linkText": "获取作品",
    "type": "jump",
    "class": ["函数库", "综合", "上架"]
  },
  {
    "title": "KittenN  3D Triangle",
    "icon": "fas fa-cube",
    "description": " <p>原作者：imaginary number</p><p>KittenN也要渲染3D三角形</p>",
    "link": "https://kn.codemao.cn/view/?workId=252508272",
    "linkText": "获取作品",
    "type": "jump",
    "class": ["3D", "渲染", "上架"]
  },
  {
    "title": "VertezForge Engine 4",
    "icon": "fas fa-cube",
    "description": " <p>原作者：imaginary number</p><p>这是一个里程碑....</p><p>它代表着猫站矢量3D的最高境界......</p><p>同时也代表着矢量3D的开发已经成熟了......</p><p>没有人，能达到它的水平.......</p><a href='https://shequ.codemao.cn/community/1637503' target='_blank'>🤔使用教程</a><p>此为Kitten 3作品</p>",
    "link": "https://shequ.codemao.cn/work/278330115",
    "linkText": "获取作品",
    "type": "jump",
    "class": ["3D", "引擎", "上架"]
  }
]"#;

fn parse_snapshot(json: &str, label: &str) -> Vec<RawResource> {
    match serde_json::from_str(json) {
        Ok(list) => decode_entries(list),
        Err(e) => {
            leptos::logging::error!("[resources] {label} snapshot is malformed: {e}");
            Vec::new()
        }
    }
}

/// Last-known-good list used when every endpoint fails or none is configured.
pub fn bundled_resources() -> Vec<RawResource> {
    parse_snapshot(BUNDLED_JSON, "bundled")
}

/// Hand-picked entries shown above the directory. They already carry a
/// special tag.
pub fn featured_resources() -> Vec<RawResource> {
    parse_snapshot(FEATURED_JSON, "featured")
}
