/*!
# Programs

A program is a small script stored under a name. It runs with its own
variables; the arguments it was called with are in the array `ARGV`.

```text
# fib.calc
n = ARGV[0]; a = 0; b = 1
WHILE n > 0 DO
    t = a + b; a = b; b = t
    n -= 1
END
RETURN a
```

Statements are separated by new lines or `;`. A `#` starts a comment
which runs to the end of the line. Two expressions on the same line
need a `;` between them.

## Statements

| Statement | Effect |
|---|---|
| `IF c THEN ... ELSEIF c THEN ... ELSE ... END` | Conditional |
| `WHILE c DO ... END` | Loop while `c` is true |
| `BREAK` | Leave the innermost loop |
| `CONTINUE` | Go back to the test of the innermost loop |
| `name:` | Label |
| `GOTO name` | Jump to a label |
| `PRINT expr` | Append the value to the output |
| `RETURN expr` | Stop with a value |
| `EXIT` | Stop without a value |
| `PUSH a, expr` | Append to array `a` |
| `POP a` | Remove the last item of `a` |
| `UNSHIFT a, expr` | Insert at the front of `a` |
| `SHIFT a` | Remove the first item of `a` |
| `REDIM a, n` | Resize `a` to `n` items, new items are 0 |

An `IF` or `WHILE` whose body starts on the same line as its `THEN` or
`DO` may leave out the `END`; the block closes at the end of the line.

```text
IF x < 0 THEN x = -x
```

`PRINT` does not end the line by itself. Print `"\n"` where a line
should end. The output is shown when the outermost program finishes.

## Errors

A program which fails to compile or stops with an error returns an
error value in place of its result, such as `#Division by zero`.
Programs may call programs, 32 deep at most.

*/
