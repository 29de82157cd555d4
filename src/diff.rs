//! Line-based unified diff for showing what an overwrite would change.

const CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

/// Unified diff of `old` → `new`. Empty when the line sequences are equal.
pub fn unified(old: &str, new: &str, old_label: &str, new_label: &str) -> String {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();
    let ops = edit_script(&a, &b);

    if ops.iter().all(|(op, _)| *op == Op::Equal) {
        return String::new();
    }

    // positions[k] = (old lines, new lines) consumed before ops[k]
    let mut positions = Vec::with_capacity(ops.len() + 1);
    let (mut i, mut j) = (0usize, 0usize);
    for (op, _) in &ops {
        positions.push((i, j));
        match op {
            Op::Equal => {
                i += 1;
                j += 1;
            }
            Op::Delete => i += 1,
            Op::Insert => j += 1,
        }
    }

    let mut out = format!("--- {}\n+++ {}\n", old_label, new_label);
    for (start, end) in hunks(&ops) {
        let slice = &ops[start..end];
        let old_count = slice.iter().filter(|(op, _)| *op != Op::Insert).count();
        let new_count = slice.iter().filter(|(op, _)| *op != Op::Delete).count();
        let (old_pos, new_pos) = positions[start];
        let old_start = if old_count > 0 { old_pos + 1 } else { old_pos };
        let new_start = if new_count > 0 { new_pos + 1 } else { new_pos };

        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_start, old_count, new_start, new_count
        ));
        for (op, line) in slice {
            let sign = match op {
                Op::Equal => ' ',
                Op::Delete => '-',
                Op::Insert => '+',
            };
            out.push(sign);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Shortest edit script via longest common subsequence. Unit files are a few
/// dozen lines, so the quadratic table is fine.
fn edit_script<'a>(a: &[&'a str], b: &[&'a str]) -> Vec<(Op, &'a str)> {
    let (n, m) = (a.len(), b.len());
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            ops.push((Op::Equal, a[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            ops.push((Op::Delete, a[i]));
            i += 1;
        } else {
            ops.push((Op::Insert, b[j]));
            j += 1;
        }
    }
    ops.extend(a[i..].iter().map(|l| (Op::Delete, *l)));
    ops.extend(b[j..].iter().map(|l| (Op::Insert, *l)));
    ops
}

/// Half-open op ranges covering each change plus its context, merged when
/// they touch.
fn hunks(ops: &[(Op, &str)]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (k, (op, _)) in ops.iter().enumerate() {
        if *op == Op::Equal {
            continue;
        }
        let start = k.saturating_sub(CONTEXT);
        let end = (k + 1 + CONTEXT).min(ops.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => ranges.push((start, end)),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_is_empty() {
        assert_eq!(unified("a\nb\n", "a\nb\n", "old", "new"), "");
    }

    #[test]
    fn single_line_change() {
        let old = "[Service]\nType=oneshot\nExecStart=/bin/old\n";
        let new = "[Service]\nType=oneshot\nExecStart=/bin/new\n";
        let diff = unified(old, new, "a/x.service", "b/x.service");
        assert_eq!(
            diff,
            "--- a/x.service\n+++ b/x.service\n\
             @@ -1,3 +1,3 @@\n [Service]\n Type=oneshot\n-ExecStart=/bin/old\n+ExecStart=/bin/new\n"
        );
    }

    #[test]
    fn distant_changes_make_two_hunks() {
        let old: String = (1..=20).map(|n| format!("line{}\n", n)).collect();
        let new = old.replace("line2\n", "LINE2\n").replace("line19\n", "LINE19\n");
        let diff = unified(&old, &new, "a", "b");
        assert_eq!(diff.matches("@@ -").count(), 2);
        assert!(diff.contains("@@ -1,5 +1,5 @@\n"));
        assert!(diff.contains("@@ -16,5 +16,5 @@\n"));
    }

    #[test]
    fn pure_insertion_into_empty() {
        let diff = unified("", "x\ny\n", "a", "b");
        assert!(diff.contains("@@ -0,0 +1,2 @@\n+x\n+y\n"));
    }

    #[test]
    fn deletion_at_end() {
        let diff = unified("a\nb\nc\n", "a\nb\n", "a", "b");
        assert!(diff.contains("@@ -1,3 +1,2 @@\n a\n b\n-c\n"));
    }
}
