use std::collections::VecDeque;

use crate::models::{Orientation, Row};

/// Orders packed rows for visual variety.
///
/// Non-pano rows alternate between landscape and portrait where possible and
/// avoid repeating the previous row's size. Selection order for the next
/// non-pano row is: preferred type with a different size, preferred type,
/// other type with a different size, other type.
///
/// Pano rows are spread through the sequence: one is placed after every
/// `ceil(non_pano / (pano + 1))` non-pano rows, never first and never next to
/// another pano while non-pano rows remain. A trailing pano is moved back to
/// the last slot between two non-pano rows when one exists.
pub fn sequence_rows(landscape: Vec<Row>, portrait: Vec<Row>, pano: Vec<Row>) -> Vec<Row> {
    let mut landscape = landscape;
    let mut portrait = portrait;
    let mut panos: VecDeque<Row> = pano.into();

    let non_pano_total = landscape.len() + portrait.len();
    let spacing = non_pano_total.div_ceil(panos.len() + 1).max(1);

    let mut out = Vec::with_capacity(non_pano_total + panos.len());
    let mut last_class: Option<Orientation> = None;
    let mut last_size: Option<usize> = None;
    let mut since_pano = 0usize;

    loop {
        if since_pano >= spacing {
            if let Some(row) = panos.pop_front() {
                out.push(row);
                since_pano = 0;
                continue;
            }
        }

        if let Some(row) = take_next(&mut landscape, &mut portrait, last_class, last_size) {
            last_class = Some(row.row_class);
            last_size = Some(row.len());
            since_pano += 1;
            out.push(row);
            continue;
        }

        // Only panos remain.
        match panos.pop_front() {
            Some(row) => out.push(row),
            None => break,
        }
    }

    relocate_trailing_panos(&mut out);
    out
}

fn take_next(
    landscape: &mut Vec<Row>,
    portrait: &mut Vec<Row>,
    last_class: Option<Orientation>,
    last_size: Option<usize>,
) -> Option<Row> {
    let (preferred, other) = match last_class {
        Some(Orientation::Landscape) => (portrait, landscape),
        _ => (landscape, portrait),
    };

    take_different_size(preferred, last_size)
        .or_else(|| take_first(preferred))
        .or_else(|| take_different_size(other, last_size))
        .or_else(|| take_first(other))
}

fn take_different_size(rows: &mut Vec<Row>, last_size: Option<usize>) -> Option<Row> {
    let idx = rows.iter().position(|row| Some(row.len()) != last_size)?;
    Some(rows.remove(idx))
}

fn take_first(rows: &mut Vec<Row>) -> Option<Row> {
    if rows.is_empty() {
        None
    } else {
        Some(rows.remove(0))
    }
}

/// Moves a trailing pano to the nearest earlier slot flanked by two non-pano
/// rows. Leaves it at the end when there is no such slot.
fn relocate_trailing_panos(rows: &mut Vec<Row>) {
    let pano_count = rows.iter().filter(|r| r.is_pano()).count();
    for _ in 0..pano_count {
        if !rows.last().is_some_and(Row::is_pano) || rows.len() < 3 {
            return;
        }
        let tail_idx = rows.len() - 1;
        let slot = (1..tail_idx)
            .rev()
            .find(|&i| !rows[i - 1].is_pano() && !rows[i].is_pano());
        match slot {
            Some(i) => {
                if let Some(pano) = rows.pop() {
                    rows.insert(i, pano);
                }
            }
            None => return,
        }
    }
}
