/// Splits an already sorted list into fixed-size pages. Pages are numbered
/// from 0; page 0 is the front page.
pub struct Paginator<'a, T> {
    post_list: &'a [T],
    page_size: usize,
    page_count: usize,
}

/// One page of a [`Paginator`] along with the file names of its neighbours.
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    pub number: usize,
    pub file_name: String,
    pub items: &'a [T],
    pub prev_file: Option<String>,
    pub next_file: Option<String>,
}

/// `index.html` for page 0, `index-N.html` after that.
pub fn page_file_name(index_page: &str, page: usize) -> String {
    if page == 0 {
        return index_page.to_string();
    }
    match index_page.rsplit_once('.') {
        Some((stem, ext)) => format!("{}-{}.{}", stem, page, ext),
        None => format!("{}-{}", index_page, page),
    }
}

impl<'a, T> Paginator<'a, T> {
    pub fn from(post_list: &'a [T], page_size: usize) -> Self {
        let page_size = page_size.max(1);
        if post_list.is_empty() {
            return Paginator {
                post_list,
                page_size,
                page_count: 0,
            };
        }
        let upper_bound = post_list.len() - 1;
        let page_count = (upper_bound / page_size) + 1;

        Paginator {
            post_list,
            page_size,
            page_count,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn get_page(&self, page: usize) -> Result<&'a [T], String> {
        if page >= self.page_count {
            return Err(format!("Page has to be less than page_count ({})", self.page_count));
        }

        let index = page * self.page_size;
        let end = (index + self.page_size).min(self.post_list.len());
        Ok(&self.post_list[index..end])
    }

    /// Every page in order, named after `index_page`.
    pub fn pages(&self, index_page: &str) -> Vec<Page<'a, T>> {
        let mut pages = Vec::with_capacity(self.page_count);
        for number in 0..self.page_count {
            let items = self.get_page(number).unwrap_or(&[]);
            pages.push(Page {
                number,
                file_name: page_file_name(index_page, number),
                items,
                prev_file: if number > 0 { Some(page_file_name(index_page, number - 1)) } else { None },
                next_file: if number + 1 < self.page_count { Some(page_file_name(index_page, number + 1)) } else { None },
            });
        }
        pages
    }
}
