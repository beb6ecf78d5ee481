/*!
# Expressions and Types

Expressions use the operators of C with the precedence C gives them.
Note that `==` binds tighter than `&`, so `a & b == c` means
`a & (b == c)`.

| Precedence | Operators |
|---|---|
| 15 | `++` `--` |
| 14 | unary `-` `~` `!` |
| 13 | `*` `/` `%` |
| 12 | `+` `-` |
| 11 | `<<` `>>` |
| 10 | `<` `>` `<=` `>=` |
| 9 | `==` `!=` |
| 8 | `&` |
| 7 | `^` |
| 6 | `\|` |
| 5 | `&&` |
| 4 | `\|\|` |
| 3 | `? :` |
| 2 | `=` `+=` `-=` `*=` `/=` `%=` `<<=` `>>=` `&=` `^=` `\|=` |

## Numbers

The calculator works with either 64 bit or 32 bit numbers; start it with
`--bits32` for the narrow kind. Integer literals may be written in hex
with `0x` or octal with a leading `0`. Literals with a `.` or an
exponent are floating point. When two numbers of different kinds meet,
the narrower one is promoted: 32 bit integer, then 32 bit float, then
64 bit integer, then 64 bit float. Integer arithmetic wraps.

Dividing an integer by integer zero is an error. Floating point division
by zero gives infinity.

```text
1/0      Division by zero
1.0/0    inf
```

## Strings

Strings are written in double or single quotes and understand the
escapes `\n`, `\t`, `\\`, `\"` and `\xNN`. `+` joins a string with
anything, and `*` repeats a string up to 1000 times.

```text
"ab" * 3     "ababab"
"x" + 1      "x1"
len("héllo") 5
```

## Arrays

Arrays are written in brackets and indexed from zero. A negative index
counts from the end.

```text
a = [1, 2, 3]
a[0] + a[-1]   4
```

## Units

A number followed directly by a unit suffix is a measure. Distance,
temperature, mass and angle are supported. An SI prefix `u`, `m`, `c`
or `K` may come before a metric suffix.

| Category | Suffixes |
|---|---|
| Distance | `m` `in` `ft` `mi` `pt` |
| Temperature | `degC` `degF` `degK` |
| Mass | `g` `Lb` `oz` |
| Angle | `rad` `deg` |

Every measure is converted to the default unit of its category, chosen
with `--distance`, `--temperature`, `--mass` and `--angle`. Comparisons
and bit operations drop the unit.

## Functions and constants

`sin` `cos` `tan` `asin` `acos` `atan` `pow` `exp` `log` `sqrt` `floor`
`ceil` `round` and `len` are built in. Trigonometry takes radians; an
angle measure is converted first, so `sin(90deg)` is 1. The constants
are `pi`, `e`, `ln2`, `time` (seconds since midnight) and `now`
(seconds since 1970).

## Display

`--format` picks how numbers are shown: `auto`, `dec`, `hex`, `oct` or
`bin`. Binary output groups bits by eight. In any mode but `auto`
strings show the codes of their characters.

*/
