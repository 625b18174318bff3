//! Client-side narrowing and ordering of the catalog.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::Datelike;

use crate::models::Movie;

pub const MIN_YEAR: i32 = 1900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    RatingDesc,
    RatingAsc,
    YearDesc,
    YearAsc,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::RatingDesc,
        SortKey::RatingAsc,
        SortKey::YearDesc,
        SortKey::YearAsc,
        SortKey::TitleAsc,
        SortKey::TitleDesc,
    ];

    /// Localization key for the dropdown entry.
    pub fn label_key(self) -> &'static str {
        match self {
            SortKey::RatingDesc => "sort_rating_desc",
            SortKey::RatingAsc => "sort_rating_asc",
            SortKey::YearDesc => "sort_year_desc",
            SortKey::YearAsc => "sort_year_asc",
            SortKey::TitleAsc => "sort_title_asc",
            SortKey::TitleDesc => "sort_title_desc",
        }
    }

    fn compare(self, a: &Movie, b: &Movie) -> Ordering {
        match self {
            SortKey::RatingAsc => a.rating.total_cmp(&b.rating),
            SortKey::RatingDesc => b.rating.total_cmp(&a.rating),
            // None < Some, so undated movies lead ascending and trail descending.
            SortKey::YearAsc => a.release_date.cmp(&b.release_date),
            SortKey::YearDesc => b.release_date.cmp(&a.release_date),
            SortKey::TitleAsc => locale_cmp(&a.title, &b.title),
            SortKey::TitleDesc => locale_cmp(&b.title, &a.title),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFilter {
    /// Empty means no genre restriction.
    pub genres: BTreeSet<String>,
    pub min_rating: f32,
    pub year_from: i32,
    pub year_to: i32,
    pub sort: SortKey,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            genres: BTreeSet::new(),
            min_rating: 0.0,
            year_from: MIN_YEAR,
            year_to: chrono::Local::now().year(),
            sort: SortKey::default(),
        }
    }
}

impl CatalogFilter {
    pub fn toggle_genre(&mut self, genre: &str) {
        if !self.genres.remove(genre) {
            self.genres.insert(genre.to_string());
        }
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        self.genres.iter().all(|g| movie.has_genre(g))
            && movie.rating >= self.min_rating
            && movie.year().is_some_and(|y| y >= self.year_from && y <= self.year_to)
    }

    /// Filtered copy in display order. `sort_by` is stable, so equal keys keep
    /// the server's order.
    pub fn apply(&self, movies: &[Movie]) -> Vec<Movie> {
        let mut out: Vec<Movie> = movies.iter().filter(|m| self.matches(m)).cloned().collect();
        out.sort_by(|a, b| self.sort.compare(a, b));
        out
    }
}

/// Every genre in the catalog, first occurrence order.
pub fn available_genres(movies: &[Movie]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for g in movies.iter().flat_map(|m| m.genres.iter()) {
        if seen.insert(g.as_str()) {
            out.push(g.clone());
        }
    }
    out
}

pub fn top_rated(movies: &[Movie], n: usize) -> Vec<Movie> {
    let mut out = movies.to_vec();
    out.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    out.truncate(n);
    out
}

/// Case- and accent-insensitive comparison, falling back to the raw strings
/// so the order stays total.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let ka = fold_key(a);
    let kb = fold_key(b);
    ka.cmp(&kb).then_with(|| a.cmp(b))
}

fn fold_key(s: &str) -> Vec<char> {
    s.chars().flat_map(char::to_lowercase).map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'č' | 'ć' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' | 'ń' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ů' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' | 'ś' => 's',
        'ž' | 'ź' | 'ż' => 'z',
        'ß' => 's',
        'ё' => 'е',
        'й' => 'и',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn movie(id: i64, title: &str, genres: &[&str], rating: f32, year: Option<i32>) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            rating,
            release_date: year.and_then(|y| NaiveDate::from_ymd_opt(y, 6, 1)),
            ..Movie::default()
        }
    }

    fn open_filter() -> CatalogFilter {
        CatalogFilter { year_from: MIN_YEAR, year_to: 2100, ..CatalogFilter::default() }
    }

    fn ids(movies: &[Movie]) -> Vec<i64> {
        movies.iter().map(|m| m.id).collect()
    }

    fn sample() -> Vec<Movie> {
        vec![
            movie(1, "Alpha", &["Action"], 8.0, Some(2005)),
            movie(2, "Bravo", &["Action", "Comedy"], 6.5, Some(2012)),
            movie(3, "Charlie", &["Comedy"], 9.1, Some(1999)),
        ]
    }

    #[test]
    fn genre_selection_requires_every_genre() {
        let mut f = open_filter();
        f.toggle_genre("Action");
        f.toggle_genre("Comedy");
        assert_eq!(ids(&f.apply(&sample())), vec![2]);
        for m in f.apply(&sample()) {
            assert!(f.genres.iter().all(|g| m.has_genre(g)));
        }
    }

    #[test]
    fn action_only_sorted_by_rating() {
        let mut f = open_filter();
        f.toggle_genre("Action");
        assert_eq!(ids(&f.apply(&sample())), vec![1, 2]);
        f.toggle_genre("Action");
        assert!(f.genres.is_empty());
        assert_eq!(ids(&f.apply(&sample())), vec![3, 1, 2]);
    }

    #[test]
    fn rating_threshold_is_inclusive() {
        let f = CatalogFilter { min_rating: 8.0, ..open_filter() };
        let out = f.apply(&sample());
        assert_eq!(ids(&out), vec![3, 1]);
        assert!(out.iter().all(|m| m.rating >= 8.0));
    }

    #[test]
    fn year_range_bounds_and_undated() {
        let mut movies = sample();
        movies.push(movie(4, "Delta", &[], 5.0, None));
        movies.push(movie(5, "Echo", &[], 5.0, Some(2000)));
        movies.push(movie(6, "Foxtrot", &[], 5.0, Some(2010)));
        let f = CatalogFilter { year_from: 2000, year_to: 2010, ..open_filter() };
        let out = f.apply(&movies);
        assert_eq!(ids(&out), vec![1, 5, 6]);
        assert!(out.iter().all(|m| (2000..=2010).contains(&m.year().unwrap_or(0))));
    }

    #[test]
    fn title_orders_are_reverses() {
        let movies = vec![
            movie(1, "bravo", &[], 5.0, Some(2001)),
            movie(2, "Échappée", &[], 5.0, Some(2001)),
            movie(3, "alpha", &[], 5.0, Some(2001)),
            movie(4, "Ёлки", &[], 5.0, Some(2001)),
            movie(5, "Елена", &[], 5.0, Some(2001)),
        ];
        let asc = CatalogFilter { sort: SortKey::TitleAsc, ..open_filter() }.apply(&movies);
        let desc = CatalogFilter { sort: SortKey::TitleDesc, ..open_filter() }.apply(&movies);
        assert_eq!(ids(&asc), vec![3, 1, 2, 5, 4]);
        let mut reversed = ids(&desc);
        reversed.reverse();
        assert_eq!(ids(&asc), reversed);
    }

    #[test]
    fn year_sort_uses_full_date_and_ties_stay_stable() {
        let mut a = movie(1, "A", &[], 5.0, Some(2001));
        a.release_date = NaiveDate::from_ymd_opt(2001, 12, 1);
        let b = movie(2, "B", &[], 5.0, Some(2001));
        let c = movie(3, "C", &[], 5.0, Some(2001));
        let asc = CatalogFilter { sort: SortKey::YearAsc, ..open_filter() }.apply(&[a.clone(), b.clone(), c.clone()]);
        assert_eq!(ids(&asc), vec![2, 3, 1]);
        let desc = CatalogFilter { sort: SortKey::YearDesc, ..open_filter() }.apply(&[a, b, c]);
        assert_eq!(ids(&desc), vec![1, 2, 3]);
    }

    #[test]
    fn no_match_yields_empty() {
        let mut f = open_filter();
        f.toggle_genre("Horror");
        assert!(f.apply(&sample()).is_empty());
        assert!(open_filter().apply(&[]).is_empty());
    }

    #[test]
    fn genre_helpers() {
        assert_eq!(available_genres(&sample()), vec!["Action".to_string(), "Comedy".to_string()]);
        assert_eq!(ids(&top_rated(&sample(), 2)), vec![3, 1]);
    }
}
