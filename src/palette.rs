/// Fixed 20-color series palette, assigned cyclically by record index.
#[derive(Debug, Clone)]
pub struct SeriesPalette {
    colors: &'static [&'static str],
}

const CATEGORY20: [&str; 20] = [
    "#1F77B4", "#AEC7E8", "#FF7F0E", "#FFBB78", "#2CA02C", "#98DF8A", "#D62728", "#FF9896",
    "#9467BD", "#C5B0D5", "#8C564B", "#C49C94", "#E377C2", "#F7B6D2", "#7F7F7F", "#C7C7C7",
    "#BCBD22", "#DBDB8D", "#17BECF", "#9EDAE5",
];

impl SeriesPalette {
    pub fn category20() -> Self {
        Self {
            colors: &CATEGORY20,
        }
    }

    pub fn color(&self, index: usize) -> &'static str {
        self.colors[index % self.colors.len()]
    }
}

impl Default for SeriesPalette {
    fn default() -> Self {
        Self::category20()
    }
}
