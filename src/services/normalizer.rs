//! 输出归一化服务 - 业务能力层
//!
//! 把模型原始 Markdown 整理成可直接渲染的文档，
//! 并提取内联控制标签携带的结构化数据
//!
//! 内联标签（<IMAGE_PROMPT>、<LESSON_OVERVIEW>、<SLIDE>）是本核心与模型之间的
//! 私有约定，本质上是自由文本里的临时序列化格式：
//! 解析一律按"对不可信文本的尽力提取"处理，残缺标签静默忽略
//!
//! 归一化是幂等的：对自身输出再跑一遍必须得到相同结果

use anyhow::Result;
use regex::Regex;

use crate::models::{GeneratedLessonResult, Slide};

/// 输出归一化服务
///
/// 职责：
/// - 提取并剥离内联控制标签
/// - 把 Markdown 管道表格压平成列表
/// - 清理水平线和多余空行
/// - 纯文本变换，无任何 I/O
pub struct OutputNormalizer;

impl OutputNormalizer {
    /// 创建新的归一化服务
    pub fn new() -> Self {
        Self
    }

    /// 归一化模型输出
    pub fn normalize(&self, raw: &str) -> Result<GeneratedLessonResult> {
        let mut text = raw.to_string();

        // 1. 提取并剥离 IMAGE_PROMPT / LESSON_OVERVIEW（各取第一个匹配）
        let image_prompt = extract_and_strip_tag(&mut text, "IMAGE_PROMPT")?;
        let lesson_overview = extract_and_strip_tag(&mut text, "LESSON_OVERVIEW")?;

        // 2. 提取并剥离全部 SLIDE 块（保持顺序）
        let slides = extract_and_strip_slides(&mut text)?;

        // 3. 模型偶尔会在标签外回显一行 "Presentation Slides" 标题，一并去掉
        //    （只吃整行，"Presentation Slides Overview" 这类更长的标题不动）
        if !slides.is_empty() {
            let heading_re =
                Regex::new(r"(?im)^[ \t]*#{0,6}[ \t]*Presentation Slides:?[ \t]*\r?$\n?")?;
            text = heading_re.replace_all(&text, "").to_string();
        }

        // 4. 压平管道表格（必须在最后的空行折叠之前）
        text = flatten_pipe_tables(&text)?;

        // 5. 去掉水平线（3 个及以上重复的 -、*、_ 组成的整行）
        let hr_re = Regex::new(r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$")?;
        text = hr_re.replace_all(&text, "").to_string();

        // 6. 折叠 3 个及以上连续换行为 2 个，去掉首尾空白
        let blank_re = Regex::new(r"\n{3,}")?;
        let text = blank_re.replace_all(&text, "\n\n").trim().to_string();

        Ok(GeneratedLessonResult {
            text,
            image_prompt,
            lesson_overview,
            slides,
        })
    }
}

impl Default for OutputNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// 提取指定标签的第一个匹配并剥离全部同名标签
fn extract_and_strip_tag(text: &mut String, tag: &str) -> Result<Option<String>> {
    let re = Regex::new(&format!(r"(?is)<{tag}>(.*?)</{tag}>"))?;

    let value = re
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|v| !v.is_empty());

    *text = re.replace_all(text, "").to_string();
    Ok(value)
}

/// 提取并剥离全部 SLIDE 块
///
/// 每块解析出 Title 行和若干 Bullet 行；没有可解析标题的块静默丢弃
fn extract_and_strip_slides(text: &mut String) -> Result<Vec<Slide>> {
    let slide_re = Regex::new(r"(?is)<SLIDE>(.*?)</SLIDE>")?;
    let title_re = Regex::new(r"(?im)^[ \t]*Title:[ \t]*(.+)$")?;
    let bullet_re = Regex::new(r"(?im)^[ \t]*Bullet:[ \t]*(.+)$")?;

    let mut slides = Vec::new();
    for caps in slide_re.captures_iter(text) {
        let body = &caps[1];

        let title = match title_re.captures(body) {
            Some(t) => t[1].trim().to_string(),
            None => continue,
        };
        if title.is_empty() {
            continue;
        }

        let bullets: Vec<String> = bullet_re
            .captures_iter(body)
            .map(|b| b[1].trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();

        slides.push(Slide { title, bullets });
    }

    *text = slide_re.replace_all(text, "").to_string();
    Ok(slides)
}

/// 统计行内管道符数量
fn pipe_count(line: &str) -> usize {
    line.matches('|').count()
}

/// 把一行表格拆成单元格
///
/// 去掉行首尾管道产生的空单元格，保留中间的空单元格
fn split_cells(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = line.split('|').map(|c| c.trim().to_string()).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

/// 判断是否为分隔行（每个单元格去掉空白后形如 ---、:---、---:、:---:）
fn is_divider_row(cells: &[String], divider_cell_re: &Regex) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            let compact: String = cell.chars().filter(|c| !c.is_whitespace()).collect();
            divider_cell_re.is_match(&compact)
        })
}

/// 把文本中的管道表格压平成列表
///
/// 连续的、每行至少 2 个管道符的行视为一张表（围栏代码块内除外）
fn flatten_pipe_tables(text: &str) -> Result<String> {
    let divider_cell_re = Regex::new(r"^:?-{2,}:?$")?;

    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            out.push(line.to_string());
            i += 1;
            continue;
        }

        if !in_fence && pipe_count(line) >= 2 {
            let start = i;
            while i < lines.len()
                && !lines[i].trim_start().starts_with("```")
                && pipe_count(lines[i]) >= 2
            {
                i += 1;
            }
            out.extend(flatten_table(&lines[start..i], &divider_cell_re));
            continue;
        }

        out.push(line.to_string());
        i += 1;
    }

    Ok(out.join("\n"))
}

/// 压平单张表
fn flatten_table(table_lines: &[&str], divider_cell_re: &Regex) -> Vec<String> {
    let rows: Vec<Vec<String>> = table_lines
        .iter()
        .map(|line| split_cells(line))
        .filter(|cells| !is_divider_row(cells, divider_cell_re))
        .filter(|cells| !cells.is_empty())
        .collect();

    match rows.len() {
        0 => Vec::new(),
        // 只有一行数据：没有可区分的表头，原始单元格分号拼接
        1 => vec![format!("- {}", rows[0].join("; "))],
        _ => {
            let header = &rows[0];
            let data = &rows[1..];

            if let Some((term_idx, def_idx)) = vocabulary_columns(header) {
                flatten_vocabulary_table(header, data, term_idx, def_idx)
            } else {
                data.iter()
                    .map(|row| {
                        let pairs: Vec<String> = row
                            .iter()
                            .enumerate()
                            .map(|(idx, cell)| match header.get(idx) {
                                Some(label) if !label.is_empty() => {
                                    format!("{}: {}", label, cell)
                                }
                                _ => cell.clone(),
                            })
                            .collect();
                        format!("- {}", pairs.join("; "))
                    })
                    .collect()
            }
        }
    }
}

/// 识别词汇表表头
///
/// 小写后的表头同时含有 "term" 类单元格和 "definition" 类单元格时命中
fn vocabulary_columns(header: &[String]) -> Option<(usize, usize)> {
    let lower: Vec<String> = header.iter().map(|c| c.to_lowercase()).collect();
    let term_idx = lower.iter().position(|c| c.contains("term"))?;
    let def_idx = lower.iter().position(|c| c.contains("definition"))?;
    Some((term_idx, def_idx))
}

/// 词汇表特殊渲染
///
/// 每行一个加粗词条，附学生友好释义和可选的插图提示子行
fn flatten_vocabulary_table(
    header: &[String],
    data: &[Vec<String>],
    term_idx: usize,
    def_idx: usize,
) -> Vec<String> {
    let third_idx = (0..header.len()).find(|&idx| idx != term_idx && idx != def_idx);

    let mut out = vec!["### Key Vocabulary".to_string(), String::new()];
    for row in data {
        let term = row.get(term_idx).map(String::as_str).unwrap_or("");
        let definition = row.get(def_idx).map(String::as_str).unwrap_or("");

        out.push(format!("- **{}**", term));
        out.push(format!("  - Student-Friendly Definition: {}", definition));
        if let Some(idx) = third_idx {
            if let Some(prompt) = row.get(idx).filter(|c| !c.is_empty()) {
                out.push(format!("  - Child-Friendly Illustration Prompt: {}", prompt));
            }
        }
    }
    out
}
