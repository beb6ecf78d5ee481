/*!
# Error Messages

| Message | Cause |
|---|---|
| Syntax error | The text does not form an expression or statement. |
| Division by zero | An integer was divided by integer zero. |
| Invalid assignment | The left side of an assignment is not a variable. |
| Too many parenthesis | A closing parenthesis has no opening one. |
| Missing operand | An operator lacks a value on one of its sides. |
| Invalid expression | The operation does not apply to these values. |
| Index out of range | An array index or an array statement ran off the end. |
| Not enough memory | A string, array or program grew too large. |
| Unknown function | No builtin or program has this name. |
| Duplicate label | A label is defined twice in one program. |
| Missing label | `GOTO` names a label which is not defined. |
| Not inside a loop | `BREAK` or `CONTINUE` outside of `WHILE`. |
| Missing END keyword | A block is still open at the end of the program. |
| Missing semicolon | Two expressions on one line without `;`. |
| Output overflow | A program printed more than 64K bytes. |
| Too many nested calls | Programs called each other more than 32 deep. |
| Interrupted | CTRL-C stopped the program. |

Errors found while compiling a program name the line they are on.

*/
