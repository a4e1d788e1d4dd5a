//! Compiler benchmarks: tokenizing and full compilation of a
//! representative class.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jackc::compile_to_string;
use jackc::lexer::Tokenizer;

const POINT_SOURCE: &str = r#"
class Point {
    field int x, y;
    static int count;

    constructor Point new(int ax, int ay) {
        let x = ax;
        let y = ay;
        let count = count + 1;
        return this;
    }

    method int getX() { return x; }
    method int getY() { return y; }

    method int manhattan(Point other) {
        var int dx, dy;
        let dx = x - other.getX();
        let dy = y - other.getY();
        if (dx < 0) { let dx = -dx; }
        if (dy < 0) { let dy = -dy; }
        return dx + dy;
    }

    function int getCount() {
        return count;
    }

    method void print() {
        do Output.printString("(");
        do Output.printInt(x);
        do Output.printString(", ");
        do Output.printInt(y);
        do Output.printString(")");
        return;
    }
}
"#;

fn tokenizer_benchmarks(c: &mut Criterion) {
    c.bench_function("tokenize_point", |b| {
        b.iter(|| {
            let mut tokenizer = Tokenizer::new(black_box(POINT_SOURCE));
            let mut tokens = 0usize;
            while tokenizer.has_more_tokens() {
                tokenizer.advance();
                tokens += 1;
            }
            tokens
        })
    });
}

fn compilation_benchmarks(c: &mut Criterion) {
    c.bench_function("compile_point", |b| {
        b.iter(|| compile_to_string(black_box(POINT_SOURCE), "Point"))
    });
}

criterion_group!(benches, tokenizer_benchmarks, compilation_benchmarks);
criterion_main!(benches);
