//! 练习题后处理服务 - 业务能力层
//!
//! 保证生成的练习题可以纯文本打印：
//! 扫描 Markdown 中的练习题块，检测指向外部视觉素材的占位短语，
//! 命中时对全部练习题块发起一次定向重写，再按行范围原位回填
//!
//! 这是尽力而为的质量修复环节：重写失败只记日志，绝不让整个生成失败

use std::collections::HashMap;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, warn};

use crate::services::llm_service::{generate_with_fallback, ModelInvoker};

/// 练习题块
///
/// Markdown 中以 "### Worksheet" 开头、
/// 到下一个 1-3 级标题（或文末）为止的连续行范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetBlock {
    /// 提取顺序编号（从 0 开始，用于重写往返时的索引对齐）
    pub index: usize,
    /// 起始行号（含）
    pub start_line: usize,
    /// 结束行号（不含）
    pub end_line: usize,
    /// 原始内容
    pub content: String,
}

/// 练习题后处理服务
pub struct WorksheetService;

impl WorksheetService {
    /// 创建新的练习题后处理服务
    pub fn new() -> Self {
        Self
    }

    /// 对文本做一轮占位短语修复（尽力而为）
    ///
    /// 只有在提取到练习题块且至少一块被标记时才发起重写调用；
    /// 重写调用失败或响应解析不出任何块时，保留原文并记录警告
    pub async fn repair_worksheets<M: ModelInvoker>(
        &self,
        invoker: &M,
        candidates: &[String],
        text: &str,
        temperature: f32,
    ) -> String {
        match self.try_repair(invoker, candidates, text, temperature).await {
            Ok(repaired) => repaired,
            Err(e) => {
                warn!("练习题重写失败，保留原文: {}", e);
                text.to_string()
            }
        }
    }

    async fn try_repair<M: ModelInvoker>(
        &self,
        invoker: &M,
        candidates: &[String],
        text: &str,
        temperature: f32,
    ) -> Result<String> {
        let blocks = self.extract_blocks(text)?;
        if blocks.is_empty() {
            debug!("未提取到练习题块，跳过重写");
            return Ok(text.to_string());
        }

        let flagged = self.flagged_indices(&blocks)?;
        if flagged.is_empty() {
            debug!("练习题块中未检测到占位短语，跳过重写");
            return Ok(text.to_string());
        }

        debug!(
            "检测到 {}/{} 个练习题块包含占位短语，发起重写",
            flagged.len(),
            blocks.len()
        );

        // 全部块一起重发（不只发被标记的块），保持索引对齐并给模型完整上下文
        let rewrite_prompt = self.build_rewrite_prompt(&blocks);
        let response =
            generate_with_fallback(invoker, candidates, &rewrite_prompt, temperature).await?;

        let rewritten = self.parse_rewrite_response(&response)?;
        if rewritten.is_empty() {
            warn!("重写响应中没有可解析的练习题块，保留原文");
            return Ok(text.to_string());
        }

        Ok(self.splice_rewritten(text, &blocks, &rewritten))
    }

    /// 逐行扫描提取练习题块
    pub fn extract_blocks(&self, text: &str) -> Result<Vec<WorksheetBlock>> {
        let start_re = Regex::new(r"(?i)^###\s+Worksheet\b")?;
        // 块在下一个 1-3 级标题前结束；#### 等更深的标题属于块内部
        let boundary_re = Regex::new(r"^#{1,3}\s")?;

        let lines: Vec<&str> = text.lines().collect();
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if start_re.is_match(lines[i]) {
                let start = i;
                let mut end = i + 1;
                while end < lines.len() && !boundary_re.is_match(lines[end]) {
                    end += 1;
                }
                blocks.push(WorksheetBlock {
                    index: blocks.len(),
                    start_line: start,
                    end_line: end,
                    content: lines[start..end].join("\n"),
                });
                i = end;
            } else {
                i += 1;
            }
        }

        Ok(blocks)
    }

    /// 检查单个块是否包含占位短语
    ///
    /// 任何一条模式命中即标记整个块；
    /// 模式有意保持宽泛（"draw a picture of ..." 这类合法指令也会命中），
    /// 与线上行为保持一致
    pub fn contains_placeholder(&self, content: &str) -> Result<bool> {
        for pattern in placeholder_patterns()? {
            if pattern.is_match(content) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 返回被标记的块索引列表
    fn flagged_indices(&self, blocks: &[WorksheetBlock]) -> Result<Vec<usize>> {
        let mut flagged = Vec::new();
        for block in blocks {
            if self.contains_placeholder(&block.content)? {
                flagged.push(block.index);
            }
        }
        Ok(flagged)
    }

    /// 构建定向重写提示词
    ///
    /// 全部块以 `<WORKSHEET_BLOCK index="N">` 包裹逐字重发
    pub fn build_rewrite_prompt(&self, blocks: &[WorksheetBlock]) -> String {
        let mut prompt = String::from(
            "Some of the worksheet sections below reference pictures, images, diagrams, or other \
             visuals. Worksheets must be printable as plain text, so rewrite every worksheet block \
             to be fully self-contained.\n\n\
             Hard constraints for every block:\n\
             - Keep the block's heading line exactly as it is.\n\
             - Keep the subsection order: Student Copy, Answer Key, Differentiation Note.\n\
             - The Student Copy must keep its name/date line, Standard Alignment, Directions, \
             and Total Points fields.\n\
             - Never reference, describe, or leave space for any picture, image, photo, diagram, \
             chart, or other visual.\n\
             - Do not use Markdown tables, HTML, or code fences.\n\n\
             Return every block, rewritten or not, wrapped in the same tags you receive it in:\n\
             <WORKSHEET_BLOCK index=\"N\">...</WORKSHEET_BLOCK>\n\n",
        );

        for block in blocks {
            prompt.push_str(&format!(
                "<WORKSHEET_BLOCK index=\"{}\">\n{}\n</WORKSHEET_BLOCK>\n\n",
                block.index, block.content
            ));
        }

        prompt
    }

    /// 解析重写响应
    ///
    /// 对不可信的模型输出做尽力提取：缺失、残缺的块直接忽略
    pub fn parse_rewrite_response(&self, response: &str) -> Result<HashMap<usize, String>> {
        let re = Regex::new(r#"(?is)<WORKSHEET_BLOCK\s+index="(\d+)">(.*?)</WORKSHEET_BLOCK>"#)?;

        let mut rewritten = HashMap::new();
        for caps in re.captures_iter(response) {
            let index: usize = match caps[1].parse() {
                Ok(i) => i,
                Err(_) => continue,
            };
            let content = caps[2].trim().to_string();
            if !content.is_empty() {
                rewritten.insert(index, content);
            }
        }

        Ok(rewritten)
    }

    /// 按行范围回填重写后的块
    ///
    /// 响应中缺失的索引不视为错误，对应块原样保留
    pub fn splice_rewritten(
        &self,
        text: &str,
        blocks: &[WorksheetBlock],
        rewritten: &HashMap<usize, String>,
    ) -> String {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();

        // 从后往前回填，避免行号失效
        for block in blocks.iter().rev() {
            if let Some(new_content) = rewritten.get(&block.index) {
                let new_lines: Vec<String> = new_content.lines().map(str::to_string).collect();
                lines.splice(block.start_line..block.end_line, new_lines);
            }
        }

        lines.join("\n")
    }
}

impl Default for WorksheetService {
    fn default() -> Self {
        Self::new()
    }
}

/// 占位短语模式集
///
/// 五类模式，全部大小写不敏感
fn placeholder_patterns() -> Result<Vec<Regex>> {
    Ok(vec![
        // 括号形式 "(picture of ...)"
        Regex::new(r"(?i)\((?:picture|image|photo|illustration)\s+of[^)]*\)")?,
        // 裸形式 "picture of"
        Regex::new(r"(?i)\b(?:picture|image|photo|illustration)\s+of\b")?,
        // "see the picture/image/diagram/chart/graphic"
        Regex::new(r"(?i)\bsee\s+the\s+(?:picture|image|diagram|chart|graphic)\b")?,
        // "use the picture/image/diagram"
        Regex::new(r"(?i)\buse\s+the\s+(?:picture|image|diagram)\b")?,
        // 方括号形式 "[insert ... picture ...]"
        Regex::new(r"(?i)\[\s*insert[^\]]*(?:picture|image|diagram)[^\]]*\]")?,
    ])
}
